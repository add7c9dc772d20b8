//! `retrato check`: one minimal completion per configured provider slot.

use anyhow::Result;
use console::style;
use serde::Serialize;

use retrato_infra::llm::{build_route, test_provider_connection};
use retrato_types::config::{ProviderConfig, RetratoConfig};
use retrato_types::llm::ProviderSlot;

#[derive(Debug, Serialize)]
struct SlotReport {
    slot: ProviderSlot,
    name: String,
    model: String,
    configured: bool,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn check_slot(slot: ProviderSlot, config: &ProviderConfig) -> SlotReport {
    let mut report = SlotReport {
        slot,
        name: config.name.clone(),
        model: config.model.clone(),
        configured: false,
        healthy: false,
        error: None,
    };

    match build_route(slot, config) {
        Ok(Some(route)) => {
            report.configured = true;
            match test_provider_connection(&route.provider, route.call_timeout).await {
                Ok(()) => report.healthy = true,
                Err(e) => report.error = Some(e.to_string()),
            }
        }
        Ok(None) => {
            report.error = Some(if config.enabled {
                format!("{} is not set", config.api_key_env)
            } else {
                "disabled in config".to_string()
            });
        }
        Err(e) => report.error = Some(e.to_string()),
    }

    report
}

/// Check both slots and print the outcome. Fails when no slot is healthy.
pub async fn run_check(config: &RetratoConfig, json: bool) -> Result<()> {
    let reports = vec![
        check_slot(ProviderSlot::Primary, &config.primary).await,
        check_slot(ProviderSlot::Secondary, &config.secondary).await,
    ];

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!();
        println!("  {} Provider check", style("🔍").bold());
        println!();
        for report in &reports {
            let mark = if report.healthy {
                style("✓").green()
            } else if report.configured {
                style("✗").red()
            } else {
                style("-").dim()
            };
            println!(
                "  {} {:<9} {} ({})",
                mark,
                report.slot.to_string(),
                style(&report.name).cyan(),
                report.model
            );
            if let Some(error) = &report.error {
                println!("      {}", style(error).dim());
            }
        }
        println!();
    }

    if reports.iter().any(|r| r.healthy) {
        Ok(())
    } else {
        anyhow::bail!("no provider answered")
    }
}
