use anyhow::{bail, Context};
use clap::Subcommand;
use rust_decimal::Decimal;

use crate::api::Pagination;
use crate::auth::{hash_password, is_known_city, Role};
use crate::cli::{connect, utils, OutputFormat};
use crate::config;
use crate::database::DatabaseError;
use crate::services::user_service::{NewUser, UserFilter};
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Create {
        #[arg(long, help = "Login (stored lower-case)")]
        login: String,
        #[arg(long, help = "Initial password")]
        password: String,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "HIRING_MANAGER, OPS_MANAGER, MIXED_MANAGER, COUNTRY_MANAGER or ADMIN")]
        role: String,
        #[arg(long, help = "City code, e.g. WARSAW")]
        city: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, help = "Gross monthly salary")]
        salary: Option<Decimal>,
        #[arg(long, default_value = "PLN")]
        currency: String,
    },

    #[command(about = "List users")]
    List {
        #[arg(long, help = "Only users of this city")]
        city: Option<String>,
        #[arg(long, help = "Include deactivated accounts")]
        all: bool,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let service = UserService::new(connect(config).await?);

    match cmd {
        UserCommands::Create {
            login,
            password,
            name,
            role,
            city,
            email,
            salary,
            currency,
        } => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let city = city.trim().to_uppercase();
            if !is_known_city(&city) {
                bail!("Unknown city: {city}");
            }
            if login.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
                bail!("login, password and name must not be empty");
            }

            let password_hash = hash_password(password, config.security.bcrypt_cost).await?;
            let created = service
                .create(NewUser {
                    login,
                    password_hash,
                    email,
                    name,
                    role,
                    city,
                    salary_gross: salary,
                    currency,
                })
                .await;

            let user = match created {
                Err(DatabaseError::UniqueViolation { .. }) => bail!("User with this login already exists"),
                other => other.context("failed to create user")?,
            };

            utils::output_success(
                &output_format,
                &format!("Created {} ({}, {})", user.login, user.role, user.city),
                Some(serde_json::to_value(&user)?),
            )
        }

        UserCommands::List { city, all } => {
            let filter = UserFilter {
                city: city.map(|c| c.trim().to_uppercase()),
                role: None,
                is_active: if all { None } else { Some(true) },
            };
            let (users, total) = service
                .list(&filter, Pagination { page: 1, limit: 1000 })
                .await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&users)?),
                OutputFormat::Text => {
                    for user in &users {
                        let status = if user.is_active { "" } else { " (inactive)" };
                        println!("{:<24} {:<16} {:<10} {}{}", user.login, user.role, user.city, user.name, status);
                    }
                    println!("{total} user(s)");
                }
            }
            Ok(())
        }
    }
}
