pub mod accounts;
pub mod billing;
pub mod photo_service;
pub mod storage;
