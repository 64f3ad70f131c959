use cellarhand_core::config::{AppConfig, LoadOptions};
use cellarhand_sheet::SheetClient;
use serde::Serialize;

use super::block_on;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_completion_credential(&config));
            checks.push(check_sheet_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "completion_credential",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "sheet_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_completion_credential(config: &AppConfig) -> DoctorCheck {
    if config.llm.api_key.is_some() {
        DoctorCheck {
            name: "completion_credential",
            status: CheckStatus::Pass,
            details: "llm.api_key is configured".to_string(),
        }
    } else {
        DoctorCheck {
            name: "completion_credential",
            status: CheckStatus::Fail,
            details: "llm.api_key is not set; chat will degrade to the apology message"
                .to_string(),
        }
    }
}

fn check_sheet_connectivity(config: &AppConfig) -> DoctorCheck {
    let result = block_on(async {
        let client =
            SheetClient::new(&config.sheet).map_err(|error| error.to_string())?;
        let snapshot =
            client.fetch_inventory().await.map_err(|error| error.to_string())?;
        Ok::<usize, String>(snapshot.len())
    });

    let fetched = match result {
        Ok(fetched) => fetched,
        Err(error) => {
            return DoctorCheck {
                name: "sheet_connectivity",
                status: CheckStatus::Fail,
                details: error,
            }
        }
    };

    match fetched {
        Ok(0) => DoctorCheck {
            name: "sheet_connectivity",
            status: CheckStatus::Fail,
            details: "export reachable but contains no records; check the LIVE tab".to_string(),
        },
        Ok(count) => DoctorCheck {
            name: "sheet_connectivity",
            status: CheckStatus::Pass,
            details: format!("fetched {count} records from the export"),
        },
        Err(error) => {
            DoctorCheck { name: "sheet_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
