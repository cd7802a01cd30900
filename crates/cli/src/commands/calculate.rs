use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::Args;
use rebate_core::engine::outcome::{
    CalculationFailure, CalculationResult, CalculationStage, FailureDisposition,
};
use rebate_core::engine::{CalculationRequest, DeterministicRebateEngine};
use rebate_core::service::RebateService;
use rebate_db::repositories::{SqlProductRepository, SqlRebateRepository};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{open_database, prepare, CommandResult};

#[derive(Debug, Default, Args)]
pub struct CalculateArgs {
    #[arg(long, help = "Rebate identifier")]
    pub rebate: Option<String>,
    #[arg(long, help = "Product identifier")]
    pub product: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = "Volume, as a decimal number")]
    pub volume: Option<String>,
}

#[derive(Debug, Serialize)]
struct CalculateOutput<'a> {
    command: &'static str,
    status: &'static str,
    error_class: Option<&'static str>,
    message: String,
    success: bool,
    stage: CalculationStage,
    amount: Option<Decimal>,
    failure: Option<&'a CalculationFailure>,
}

pub fn run(args: CalculateArgs) -> CommandResult {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt = io::stderr();
    run_with_input(args, &mut input, &mut prompt)
}

/// Same as [`run`], reading missing values from `input` after writing a
/// prompt to `prompt`.
pub fn run_with_input(
    args: CalculateArgs,
    input: &mut dyn BufRead,
    prompt: &mut dyn Write,
) -> CommandResult {
    let request = match read_request(args, input, prompt) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure("calculate", "invalid_input", format!("{error:#}"), 7)
        }
    };

    let (config, runtime) = match prepare("calculate") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let outcome = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let service = RebateService::with_engine(
            SqlProductRepository::new(pool.clone()),
            SqlRebateRepository::new(pool.clone()),
            DeterministicRebateEngine::new(config.calculation.validation_policy()),
        );
        let result = service.calculate(&request).await;
        pool.close().await;
        Ok::<CalculationResult, crate::commands::StepFailure>(result)
    });

    match outcome {
        Ok(result) => render(&result),
        Err(failure) => CommandResult::from_step("calculate", failure),
    }
}

fn read_request(
    args: CalculateArgs,
    input: &mut dyn BufRead,
    prompt: &mut dyn Write,
) -> anyhow::Result<CalculationRequest> {
    let rebate_id = match args.rebate {
        Some(value) => value,
        None => prompt_for("rebate identifier", input, prompt)?,
    };
    let product_id = match args.product {
        Some(value) => value,
        None => prompt_for("product identifier", input, prompt)?,
    };
    let volume = match args.volume {
        Some(value) => value,
        None => prompt_for("volume", input, prompt)?,
    };

    let volume = Decimal::from_str(volume.trim())
        .with_context(|| format!("volume `{}` is not a decimal number", volume.trim()))?;

    Ok(CalculationRequest::new(rebate_id.trim(), product_id.trim(), volume))
}

fn prompt_for(
    field: &str,
    input: &mut dyn BufRead,
    prompt: &mut dyn Write,
) -> anyhow::Result<String> {
    write!(prompt, "Enter {field}: ").context("failed to write prompt")?;
    prompt.flush().context("failed to write prompt")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read input")?;
    let value = line.trim();
    if read == 0 || value.is_empty() {
        bail!("no {field} given");
    }

    Ok(value.to_string())
}

fn render(result: &CalculationResult) -> CommandResult {
    let (status, error_class, exit_code, message) = match &result.failure {
        None => (
            "ok",
            None,
            0,
            format!("rebate amount {} recorded", result.amount.unwrap_or_default()),
        ),
        Some(failure) => match failure.disposition() {
            FailureDisposition::Rejected => {
                ("error", Some("calculation_rejected"), 1, failure.to_string())
            }
            FailureDisposition::Persistence => {
                ("error", Some("persistence"), 4, failure.to_string())
            }
        },
    };

    let payload = CalculateOutput {
        command: "calculate",
        status,
        error_class,
        message,
        success: result.success,
        stage: result.stage,
        amount: result.amount,
        failure: result.failure.as_ref(),
    };
    CommandResult::with_payload(exit_code, &payload)
}
