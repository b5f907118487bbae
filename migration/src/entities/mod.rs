pub mod click;
pub mod dm_log;
