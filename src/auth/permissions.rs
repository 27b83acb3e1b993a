// auth/permissions.rs - Roles and what each of them may see or change

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Claims;

/// City codes the service operates in.
pub const CITIES: [&str; 15] = [
    "WARSAW", "KRAKOW", "GDANSK", "WROCLAW", "POZNAN", "LODZ", "LUBLIN", "KATOWICE", "BYDGOSZCZ",
    "SZCZECIN", "TORUN", "RADOM", "RZESZOW", "OLSZTYN", "BIALYSTOK",
];

pub fn is_known_city(code: &str) -> bool {
    CITIES.contains(&code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    HiringManager,
    OpsManager,
    MixedManager,
    CountryManager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::HiringManager,
        Role::OpsManager,
        Role::MixedManager,
        Role::CountryManager,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::HiringManager => "HIRING_MANAGER",
            Role::OpsManager => "OPS_MANAGER",
            Role::MixedManager => "MIXED_MANAGER",
            Role::CountryManager => "COUNTRY_MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn has_hr_metrics(&self) -> bool {
        matches!(self, Role::HiringManager | Role::MixedManager)
    }

    pub fn has_ops_metrics(&self) -> bool {
        matches!(self, Role::OpsManager | Role::MixedManager)
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::HiringManager | Role::OpsManager | Role::MixedManager => CITY_MANAGER_PERMISSIONS,
            Role::CountryManager => COUNTRY_MANAGER_PERMISSIONS,
            Role::Admin => Permission::ALL,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnData,
    ViewAllUsersData,
    ViewCityData,
    ViewCountryData,
    CreateOwnMetrics,
    CreateCountryReports,
    GeneratePersonalInsights,
    ViewAllInsights,
    ExportOwnReports,
    ExportAllReports,
    SendReports,
    ManageIntegrations,
    ManageUsers,
    ViewSystemSettings,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ViewOwnData,
        Permission::ViewAllUsersData,
        Permission::ViewCityData,
        Permission::ViewCountryData,
        Permission::CreateOwnMetrics,
        Permission::CreateCountryReports,
        Permission::GeneratePersonalInsights,
        Permission::ViewAllInsights,
        Permission::ExportOwnReports,
        Permission::ExportAllReports,
        Permission::SendReports,
        Permission::ManageIntegrations,
        Permission::ManageUsers,
        Permission::ViewSystemSettings,
    ];
}

const CITY_MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnData,
    Permission::ViewCityData,
    Permission::CreateOwnMetrics,
    Permission::GeneratePersonalInsights,
    Permission::ExportOwnReports,
];

const COUNTRY_MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnData,
    Permission::ViewAllUsersData,
    Permission::ViewCityData,
    Permission::ViewCountryData,
    Permission::CreateOwnMetrics,
    Permission::CreateCountryReports,
    Permission::GeneratePersonalInsights,
    Permission::ViewAllInsights,
    Permission::ExportOwnReports,
    Permission::ExportAllReports,
    Permission::SendReports,
    Permission::ManageIntegrations,
    Permission::ManageUsers,
];

/// Which rows a caller may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataScope {
    All,
    City(String),
    Own(Uuid),
}

pub fn has_permission(claims: &Claims, permission: Permission) -> bool {
    claims.role.has_permission(permission)
}

pub fn allowed_cities(claims: &Claims) -> Vec<String> {
    if has_permission(claims, Permission::ViewAllUsersData) {
        CITIES.iter().map(|c| c.to_string()).collect()
    } else if has_permission(claims, Permission::ViewCityData) {
        vec![claims.city.clone()]
    } else {
        Vec::new()
    }
}

/// Country-level management (COUNTRY_MANAGER, ADMIN).
pub fn is_manager(claims: &Claims) -> bool {
    matches!(claims.role, Role::CountryManager | Role::Admin)
}

pub fn data_scope(claims: &Claims) -> DataScope {
    if has_permission(claims, Permission::ViewAllUsersData) {
        DataScope::All
    } else if has_permission(claims, Permission::ViewCityData) {
        DataScope::City(claims.city.clone())
    } else {
        DataScope::Own(claims.user_id)
    }
}
