//! Command-line interface of the compiler.
use argh::FromArgs;
use std::path::PathBuf;
use telos_plan::RefinerKind;
use telos_utils::{Id, OutputFile};

#[derive(FromArgs)]
/// Compile an LTLf goal specification into a BDI plan library.
pub struct Opts {
    /// the LTLf instruction, e.g. "F(on(a, b))"
    #[argh(positional)]
    pub instruction: String,

    /// path to the planning domain file
    #[argh(option, short = 'd', long = "domain")]
    pub domain: PathBuf,

    /// comma-separated problem objects; defaults to the constants the
    /// instruction mentions
    #[argh(option, long = "objects", default = "String::new()")]
    pub objects: String,

    /// comma-separated initial facts for invariant probing,
    /// e.g. "ontable(a), clear(a), handempty"
    #[argh(option, long = "init")]
    pub init: Option<String>,

    /// output file, default is stdout
    #[argh(
        option,
        short = 'o',
        long = "output",
        default = "OutputFile::Stdout"
    )]
    pub output: OutputFile,

    /// execution log file (JSON); disabled by default
    #[argh(option, long = "log", default = "OutputFile::Null")]
    pub log: OutputFile,

    /// maximum number of states per goal exploration
    #[argh(option, long = "max-states", default = "200_000")]
    pub max_states: usize,

    /// maximum regression depth; unbounded when omitted
    #[argh(option, long = "max-depth")]
    pub max_depth: Option<u32>,

    /// wall-clock budget per exploration, in seconds
    #[argh(option, long = "timeout", default = "300")]
    pub timeout: u64,

    /// partition refiner backend (minterm | bdd | auto)
    #[argh(option, long = "refiner", default = "RefinerKind::Auto")]
    pub refiner: RefinerKind,

    /// LTLf-to-DFA translator command
    #[argh(
        option,
        long = "ltlf2dfa",
        default = "PathBuf::from(\"ltlf2dfa\")"
    )]
    pub ltlf2dfa: PathBuf,

    /// SAS+ translator command for invariant extraction
    #[argh(
        option,
        long = "translator",
        default = "PathBuf::from(\"fast-downward.py\")"
    )]
    pub translator: PathBuf,

    /// logging level (error | warn | info | debug | trace)
    #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}

impl Opts {
    pub fn object_ids(&self) -> Vec<Id> {
        self.objects
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Id::new)
            .collect()
    }
}
