pub mod conf_reader;
pub mod properties;
pub mod property_name;
