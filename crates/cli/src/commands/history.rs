use rebate_core::domain::calculation::RebateCalculation;
use rebate_core::domain::rebate::RebateId;
use rebate_db::repositories::{RebateRepository, SqlRebateRepository};
use serde::Serialize;

use crate::commands::{open_database, prepare, CommandResult};

#[derive(Debug, Serialize)]
struct HistoryOutput {
    command: &'static str,
    status: &'static str,
    error_class: Option<&'static str>,
    message: String,
    rebate_id: String,
    calculations: Vec<RebateCalculation>,
}

pub fn run(rebate_id: &str) -> CommandResult {
    let (config, runtime) = match prepare("history") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let rebate_id = RebateId(rebate_id.trim().to_string());
    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let calculations = SqlRebateRepository::new(pool.clone())
            .list_calculations(&rebate_id)
            .await
            .map_err(|error| ("persistence", error.to_string(), 4u8));
        pool.close().await;
        calculations
    });

    let calculations = match result {
        Ok(calculations) => calculations,
        Err(failure) => return CommandResult::from_step("history", failure),
    };

    let payload = HistoryOutput {
        command: "history",
        status: "ok",
        error_class: None,
        message: format!("{} recorded calculation(s)", calculations.len()),
        rebate_id: rebate_id.0,
        calculations,
    };
    CommandResult::with_payload(0, &payload)
}
