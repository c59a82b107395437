use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ktask-ctl")]
#[command(about = "Inspect and cancel tasks running as cluster Jobs", long_about = None)]
pub struct Cli {
    #[arg(short, long, env = "KTASK_NAMESPACE", help = "Namespace holding the task Jobs")]
    pub namespace: Option<String>,

    #[arg(long, env = "KTASK_LOG", help = "Log filter directive [default: warn]")]
    pub log_level: Option<String>,

    #[arg(long, env = "KTASK_LOG_FORMAT", help = "Log format (text|json|journald)")]
    pub log_format: Option<String>,

    #[arg(long, help = "Print backend call metrics on exit")]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List tasks, one page at a time")]
    List {
        #[arg(long, help = "Continuation token from a previous page")]
        page_token: Option<String>,

        #[arg(long, help = "Maximum tasks per page")]
        page_size: Option<u32>,
    },

    #[command(about = "Show a task with its executors and pods")]
    Get {
        #[arg(help = "Task identifier")]
        id: String,
    },

    #[command(about = "List executor Jobs")]
    Executors {
        #[arg(help = "Task identifier; all executors when omitted")]
        id: Option<String>,
    },

    #[command(about = "List pods spawned by Jobs")]
    Pods {
        #[arg(help = "Task identifier, covering task-master and executor pods; all job pods when omitted")]
        id: Option<String>,
    },

    #[command(about = "Print a pod's log")]
    Logs {
        #[arg(help = "Pod name")]
        pod: String,
    },

    #[command(about = "Mark a task, or a single pod, as cancelled")]
    Cancel {
        #[arg(help = "Task identifier")]
        id: String,

        #[arg(long, help = "Only mark this pod; it must belong to the task")]
        pod: Option<String>,
    },
}
