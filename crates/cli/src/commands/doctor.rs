use meetline_core::config::{AppConfig, LoadOptions};
use meetline_db::connect;
use serde::Serialize;

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
            checks.push(check_line_credentials(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["line_credentials", "database_connectivity", "database_schema"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
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

/// Reports the operating mode implied by the configured credentials. Both
/// credentials are optional, so this check never fails; it tells the operator
/// what the service will actually do with the current configuration.
fn check_line_credentials(config: &AppConfig) -> DoctorCheck {
    let push = config.line.channel_access_token.is_some();
    let verify = config.line.channel_secret.is_some();

    let details = match (push, verify) {
        (true, true) => "notifications pushed; webhook signatures verified".to_string(),
        (true, false) => {
            "notifications pushed; webhook signatures unverified (line.channel_secret unset)"
                .to_string()
        }
        (false, true) => {
            "notifications logged (line.channel_access_token unset); webhook signatures verified"
                .to_string()
        }
        (false, false) => {
            "notifications logged and webhook signatures unverified (no LINE credentials set)"
                .to_string()
        }
    };

    DoctorCheck { name: "line_credentials", status: CheckStatus::Pass, details }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck {
                    name: "database_schema",
                    status: CheckStatus::Skipped,
                    details: "skipped because the async runtime did not initialize".to_string(),
                },
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck {
                        name: "database_schema",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database was unreachable".to_string(),
                    },
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };

        let schema = match sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('users', 'interactions')",
        )
        .fetch_one(&pool)
        .await
        {
            Ok(2) => DoctorCheck {
                name: "database_schema",
                status: CheckStatus::Pass,
                details: "users and interactions tables present".to_string(),
            },
            Ok(_) => DoctorCheck {
                name: "database_schema",
                status: CheckStatus::Fail,
                details: "expected tables are missing; run `meetline migrate`".to_string(),
            },
            Err(error) => DoctorCheck {
                name: "database_schema",
                status: CheckStatus::Fail,
                details: format!("failed to inspect schema: {error}"),
            },
        };

        pool.close().await;
        vec![connectivity, schema]
    })
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
