use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::services::backup_service::{BackupOptions, BackupService};
use crate::services::tenant_service::{CreateOutcome, TenantService};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "Create a new tenant with database and initial setup")]
    Create {
        #[arg(help = "Tenant display name")]
        name: String,

        #[arg(help = "Storefront domain")]
        domain: String,

        #[arg(long, help = "Admin email (defaults to admin@<domain>)")]
        admin_email: Option<String>,

        #[arg(long, help = "Admin password (defaults to a generated one)")]
        admin_password: Option<String>,
    },

    #[command(about = "Create backups for all tenant databases")]
    Backup {
        #[arg(long, help = "Pipe the dump through gzip")]
        compress: bool,

        #[arg(long, default_value_t = 7, help = "Days before a backup is cold-storage eligible")]
        retention_days: i64,

        #[arg(long, default_value_t = 30, help = "Days before a backup is deleted")]
        cold_retention_days: i64,
    },

    #[command(about = "List registered tenants")]
    List,
}

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::Create {
            name,
            domain,
            admin_email,
            admin_password,
        } => create(&name, &domain, admin_email, admin_password, output_format).await,
        TenantCommands::Backup {
            compress,
            retention_days,
            cold_retention_days,
        } => {
            backup(
                BackupOptions {
                    compress,
                    retention_days,
                    cold_retention_days,
                },
                output_format,
            )
            .await
        }
        TenantCommands::List => list(output_format).await,
    }
}

async fn create(
    name: &str,
    domain: &str,
    admin_email: Option<String>,
    admin_password: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    println!("Creating tenant: {}", name);

    let service = TenantService::new().await?;
    let outcome = service
        .create_tenant(name, domain, admin_email, admin_password)
        .await?;

    match outcome {
        CreateOutcome::DomainExists => {
            println!("Domain {} already exists. Skipping creation.", domain);
            Ok(())
        }
        CreateOutcome::Created(created) => {
            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "tenant_id": created.tenant.id,
                            "domain": created.domain,
                            "admin_email": created.admin_email,
                            "admin_password": created.admin_password,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("Tenant created successfully!");
                    println!("Domain: {}", created.domain);
                    println!("Admin Email: {}", created.admin_email);
                    println!("Admin Password: {}", created.admin_password);
                    println!("Please change the admin password on first login!");
                }
            }
            Ok(())
        }
    }
}

async fn backup(opts: BackupOptions, output_format: OutputFormat) -> anyhow::Result<()> {
    println!("Starting tenant database backups...");

    let service = TenantService::new().await?;
    let tenants = service.registry().all().await?;

    let backups = BackupService::from_config()?;
    let report = backups.run(&tenants, opts).await;

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "created": report.created,
                    "pruned": report.pruned,
                    "errors": report.errors,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("Backup completed. {} backups created.", report.created.len());
            if !report.pruned.is_empty() {
                println!("Pruned {} old backups.", report.pruned.len());
            }
            if !report.errors.is_empty() {
                println!("Errors encountered:");
                for error in &report.errors {
                    println!("  - {}", error);
                }
            }
        }
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} tenant backup(s) failed", report.errors.len())
    }
}

async fn list(output_format: OutputFormat) -> anyhow::Result<()> {
    let service = TenantService::new().await?;
    let registry = service.registry();
    let tenants = registry.all().await?;

    match output_format {
        OutputFormat::Json => {
            let mut items = Vec::with_capacity(tenants.len());
            for tenant in &tenants {
                let domains = registry.domains_for(tenant.id).await?;
                items.push(json!({
                    "id": tenant.id,
                    "name": tenant.name(),
                    "domains": domains.iter().map(|d| d.domain.clone()).collect::<Vec<_>>(),
                    "created_at": tenant.created_at,
                }));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "tenants": items }))?
            );
        }
        OutputFormat::Text => {
            if tenants.is_empty() {
                println!("No tenants registered");
                return Ok(());
            }

            println!("{:<38} {:<25} {}", "ID", "NAME", "DOMAINS");
            println!("{}", "-".repeat(90));
            for tenant in &tenants {
                let domains = registry.domains_for(tenant.id).await?;
                let domain_list = domains
                    .iter()
                    .map(|d| d.domain.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{:<38} {:<25} {}", tenant.id, tenant.name(), domain_list);
            }
        }
    }

    Ok(())
}
