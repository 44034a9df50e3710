use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "seqreplay",
    version,
    about = "Move files from a source directory to a destination directory, \
             using the last read start time of each file as a file creation time proxy."
)]
pub struct Arguments {

    #[arg(short = 's', long = "src_dir", help = "Absolute or relative path to the directory containing the FASTQ or FASTA files to be moved as if they were being written out.")]
    pub src_dir: Option<String>,

    #[arg(short = 'd', long = "dest_dir", help = "Directory to move the files from the src directory to, using last read start time as a proxy for file creation time.")]
    pub dest_dir: Option<String>,

    #[arg(short = 'c', long = "config-file", help = "Optional JSON config file. Command-line values take precedence.")]
    pub config_file: Option<String>,

    #[clap(long, help = "Optional fixed seed for the estimated read times; defaults to OS entropy")]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = false, help = "Ignore any cached file order and scan the source directory again")]
    pub rescan: bool,

    #[arg(long, default_value_t = false, help = "Save the remaining queue after every copied file so an interrupted run resumes where it stopped")]
    pub checkpoint: bool,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,
}
