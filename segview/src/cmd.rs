use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "segview", disable_help_subcommand = true)]
#[command(about = "Validate and transform segmentation scan packet logs", long_about = None)]
pub struct Cmd {
    /// Set the log verbose.
    #[arg(
        short = 'v',
        default_value = "info",
        value_name = "verbose",
        global = true,
        value_parser = ["debug","info","warn","error"]
    )]
    pub verbose: String,

    #[command(subcommand)]
    pub sub_cmd: SubCmd,
}

#[derive(Subcommand, Clone)]
pub enum SubCmd {
    /// Validate the packet records in one or more JSONL capture logs
    Check(Input),

    /// Print the validated packet records of one or more JSONL capture logs
    Print(Input),

    /// Convert JSONL capture logs into the graph data the viewer renders
    Graph(Graph),
}

#[derive(Parser, Clone)]
pub struct Input {
    /// One or more JSONL files of packet records. (e.g. seg-a.jsonl seg-b.jsonl...)
    #[arg(value_name = "FILE", required = true)]
    pub input_files: Vec<String>,
}

#[derive(Parser, Clone)]
pub struct Graph {
    #[command(flatten)]
    pub input: Input,

    /// Output file name (can be a path). Writes to stdout when not set.
    #[arg(short, long)]
    pub out: Option<String>,
}
