pub mod database_helper;
