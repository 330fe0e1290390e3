use crate::adapters::{put_json, ObjectStore, TaskQueue};
use chrono::Utc;
use common::response::Response;
use common::status::CollectionStatus;
use common::task::{CollectionPlan, CollectionRequest};
use eyre::WrapErr;
use serde_json::{json, Value};

/// Fan a collection request out into per-month, per-region tasks.
///
/// The status document is written before fan-out so observers can find the
/// collection immediately, then rewritten with the fan-out outcome.
pub async fn handle(
    event: Value,
    store: &impl ObjectStore,
    queue: &impl TaskQueue,
    bucket: &str,
) -> Response {
    match run(event, store, queue, bucket).await {
        Ok(response) => response,
        Err(error) => {
            log::error!("collection fan-out failed: {error:#}");
            Response::error(500, &format!("{error:#}"))
        }
    }
}

async fn run(
    event: Value,
    store: &impl ObjectStore,
    queue: &impl TaskQueue,
    bucket: &str,
) -> eyre::Result<Response> {
    let request: CollectionRequest =
        serde_json::from_value(event).wrap_err("invalid collection request")?;

    if request.query.trim().is_empty() {
        return Ok(Response::error(500, "Missing required parameter: query"));
    }

    let plan = CollectionPlan::new(&request, Utc::now().date_naive());
    let total = plan.tasks.len() as u32;

    log::info!(
        "collection {}: {total} tasks across {} regions",
        plan.collection_id,
        request.regions.len()
    );

    let mut status = CollectionStatus::initialize(&plan.collection_id, &request.query, total);
    let status_key = status.key();

    put_json(store, &status_key, &status)
        .await
        .wrap_err("could not write the initial collection status")?;

    let mut queued = 0u32;

    for task in &plan.tasks {
        let body = serde_json::to_string(task).wrap_err("could not serialize task")?;

        match queue.send(body).await {
            Ok(()) => queued += 1,
            Err(error) => log::warn!("could not queue {}: {error:#}", task.label()),
        }
    }

    if queued == total {
        status.mark_running();
    } else {
        log::error!("only queued {queued}/{total} tasks");
        status.mark_error(format!("Only queued {queued}/{total} tasks"));
    }

    put_json(store, &status_key, &status)
        .await
        .wrap_err("could not write the collection status")?;

    Ok(Response::ok(&json!({
        "message": "Collection initiated",
        "collection_id": plan.collection_id,
        "total_tasks": total,
        "queued_tasks": queued,
        "status_key": status_key,
        "expected_files": format!(
            "s3://{bucket}/collections/{}/[year]/[month]/[region].json",
            plan.collection_id
        ),
    })))
}
