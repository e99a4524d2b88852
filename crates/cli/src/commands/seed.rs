use vendaflow_db::{CatalogSeed, VerificationCheck};

use crate::commands::{open_migrated, prepare, CommandResult, StepError};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;

        let seed_result = CatalogSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, StepError> = if verification.all_passed {
            Ok(SeedOutput {
                products_seeded: seed_result.products_seeded,
                settings_seeded: seed_result.settings_seeded,
            })
        } else {
            Err(("seed_verification", verification_failure_message(&verification.checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let product_lines: Vec<String> = CatalogSeed::products()
                .iter()
                .map(|product| format!("  - {}: {} ({})", product.id.0, product.name, product.category))
                .collect();
            let settings = if output.settings_seeded.is_empty() {
                "none (existing values kept)".to_string()
            } else {
                output.settings_seeded.join(", ")
            };
            let message = format!(
                "demo catalog loaded with {} products:\n{}\ndefault settings written: {settings}",
                output.products_seeded,
                product_lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    products_seeded: usize,
    settings_seeded: Vec<&'static str>,
}

fn verification_failure_message(checks: &[VerificationCheck]) -> String {
    let failed_checks =
        checks.iter().filter(|check| !check.passed).map(|check| check.name.as_str()).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use vendaflow_db::VerificationCheck;

    use super::verification_failure_message;

    fn check(name: &str, passed: bool) -> VerificationCheck {
        VerificationCheck { name: name.to_string(), passed }
    }

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [
            check("product PROD-SEED-001", true),
            check("product PROD-SEED-002", false),
            check("setting budget_margin", false),
        ];

        assert_eq!(
            verification_failure_message(&checks),
            "Seed verification failed for checks: product PROD-SEED-002, setting budget_margin"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [check("product PROD-SEED-001", true), check("setting bot_name", true)];

        assert_eq!(verification_failure_message(&checks), "Some seed data failed to load");
    }
}
