mod cli;

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use ktask_core::{ClientConfig, ClusterBackend, Job, Pod, TaskClient};
use ktask_kube::KubeBackend;
use ktask_model::{LabelScheme, ListTasksResponse, PageToken, TaskId, is_cancelled};
use ktask_observe::{LoggerConfig, logger_init};
use ktask_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

use crate::cli::{Cli, Commands};

#[derive(Debug, Serialize)]
struct TaskSummary {
    id: String,
    cancelled: bool,
    created: Option<String>,
}

#[derive(Debug, Serialize)]
struct TaskView {
    id: String,
    cancelled: bool,
    master_pods: Vec<String>,
    executors: Vec<ExecutorView>,
}

#[derive(Debug, Serialize)]
struct ExecutorView {
    job: String,
    pods: Vec<String>,
}

fn summarize(scheme: &LabelScheme, job: Job) -> TaskSummary {
    TaskSummary {
        cancelled: is_cancelled(scheme, job.metadata.labels.as_ref()),
        id: job.metadata.name.unwrap_or_default(),
        created: job.metadata.creation_timestamp.map(|t| t.0.to_string()),
    }
}

fn pod_names<'a>(pods: impl IntoIterator<Item = &'a Pod>) -> Vec<String> {
    pods.into_iter()
        .filter_map(|p| p.metadata.name.clone())
        .collect()
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log = LoggerConfig::default().with_level("warn");
    if let Some(level) = &cli.log_level {
        log = log.with_level(level.as_str());
    }
    if let Some(format) = &cli.log_format {
        log = log.with_format(format.parse()?);
    }
    logger_init(&log)?;

    let mut config = ClientConfig::from_env()?;
    if let Some(ns) = &cli.namespace {
        config.namespace = ns.clone();
    }
    let backend = KubeBackend::try_default(&config)
        .await
        .context("connecting to the cluster")?;

    let metrics = PrometheusMetrics::new()?;
    let client =
        TaskClient::new(backend, config.labels.clone())?.with_metrics(Arc::new(metrics.clone()));
    info!(namespace = %client.namespace(), "client ready");

    run(&client, cli.command).await?;

    if cli.metrics {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&metrics.gather(), &mut buf)?;
        eprint!("{}", String::from_utf8_lossy(&buf));
    }
    Ok(())
}

async fn run<B: ClusterBackend>(client: &TaskClient<B>, command: Commands) -> anyhow::Result<()> {
    let scheme = client.labels().clone();
    match command {
        Commands::List {
            page_token,
            page_size,
        } => {
            let token = page_token.and_then(PageToken::from_caller);
            let page = client.list_task_master_jobs(token, page_size).await?;
            print_json(&ListTasksResponse::from_page(page, |job| {
                summarize(&scheme, job)
            }))
        }
        Commands::Get { id } => {
            let id = TaskId::new(id)?;
            let task = client.read_task(&id).await?;
            print_json(&TaskView {
                cancelled: task.is_cancelled(&scheme),
                id: id.to_string(),
                master_pods: pod_names(&task.master_pods),
                executors: task
                    .executors
                    .iter()
                    .map(|e| ExecutorView {
                        job: e.job.metadata.name.clone().unwrap_or_default(),
                        pods: pod_names(&e.pods),
                    })
                    .collect(),
            })
        }
        Commands::Executors { id } => {
            let jobs = match id {
                Some(id) => client.list_executor_jobs(&TaskId::new(id)?).await?,
                None => client.list_all_executor_jobs().await?,
            };
            let names: Vec<_> = jobs.into_iter().filter_map(|j| j.metadata.name).collect();
            print_json(&names)
        }
        Commands::Pods { id } => match id {
            Some(id) => {
                let task = client.read_task(&TaskId::new(id)?).await?;
                print_json(&pod_names(task.pods()))
            }
            None => print_json(&pod_names(&client.list_all_job_pods().await?)),
        },
        Commands::Logs { pod } => {
            match client.read_pod_log(&pod).await {
                Some(log) => print!("{log}"),
                None => eprintln!("no log available for {pod}"),
            }
            Ok(())
        }
        Commands::Cancel { id, pod } => {
            let id = TaskId::new(id)?;
            match pod {
                Some(pod) => {
                    if !client.read_task(&id).await?.contains_pod(&pod) {
                        bail!("pod {pod} does not belong to task {id}");
                    }
                    client.mark_pod_cancelled(&pod).await?;
                }
                None => client.cancel_task(&id).await?,
            }
            info!(task = %id, "cancellation requested");
            Ok(())
        }
    }
}
