use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- User Roles ---
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "accountant")]
    Accountant,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Accountant => write!(f, "accountant"),
        }
    }
}

// --- Service Categories ---
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Outdoor advertising.
    #[sea_orm(string_value = "street")]
    Street,
    /// Advertising inside premises.
    #[sea_orm(string_value = "interior")]
    Interior,
    /// Advertising on vehicles.
    #[sea_orm(string_value = "vehicle")]
    Vehicle,
    #[sea_orm(string_value = "print")]
    Print,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Street => write!(f, "street"),
            ServiceType::Interior => write!(f, "interior"),
            ServiceType::Vehicle => write!(f, "vehicle"),
            ServiceType::Print => write!(f, "print"),
        }
    }
}

// --- Request Payment Status ---
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Unpaid => write!(f, "unpaid"),
            RequestStatus::Paid => write!(f, "paid"),
        }
    }
}
