use std::fmt;

#[derive(Debug, Clone)]
pub enum ClicktrailError {
    Config(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Backup(String),
}

impl ClicktrailError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ClicktrailError::Config(_) => "E001",
            ClicktrailError::DatabaseConfig(_) => "E002",
            ClicktrailError::DatabaseConnection(_) => "E003",
            ClicktrailError::DatabaseOperation(_) => "E004",
            ClicktrailError::FileOperation(_) => "E005",
            ClicktrailError::Serialization(_) => "E006",
            ClicktrailError::Backup(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ClicktrailError::Config(_) => "Configuration Error",
            ClicktrailError::DatabaseConfig(_) => "Database Configuration Error",
            ClicktrailError::DatabaseConnection(_) => "Database Connection Error",
            ClicktrailError::DatabaseOperation(_) => "Database Operation Error",
            ClicktrailError::FileOperation(_) => "File Operation Error",
            ClicktrailError::Serialization(_) => "Serialization Error",
            ClicktrailError::Backup(_) => "Backup Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ClicktrailError::Config(msg)
            | ClicktrailError::DatabaseConfig(msg)
            | ClicktrailError::DatabaseConnection(msg)
            | ClicktrailError::DatabaseOperation(msg)
            | ClicktrailError::FileOperation(msg)
            | ClicktrailError::Serialization(msg)
            | ClicktrailError::Backup(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ClicktrailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ClicktrailError {}

// 便捷的构造函数
impl ClicktrailError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::Config(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::FileOperation(msg.into())
    }

    pub fn backup<T: Into<String>>(msg: T) -> Self {
        ClicktrailError::Backup(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ClicktrailError {
    fn from(err: sea_orm::DbErr) -> Self {
        ClicktrailError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ClicktrailError {
    fn from(err: std::io::Error) -> Self {
        ClicktrailError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ClicktrailError {
    fn from(err: serde_json::Error) -> Self {
        ClicktrailError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ClicktrailError {
    fn from(err: csv::Error) -> Self {
        ClicktrailError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClicktrailError>;
