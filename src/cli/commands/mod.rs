pub mod db;
pub mod password;
pub mod serve;
pub mod token;
