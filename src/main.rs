use std::time::Duration;
use telos::cmdline::Opts;
use telos::driver::{CompileOpts, Pipeline};
use telos::elog::ExecutionLog;
use telos::ltlf::{CommandDfaTranslator, parse_facts};
use telos_backend::{AgentSpeakBackend, Backend};
use telos_plan::{CommandSasRunner, SearchConfig};

fn main() {
    let opts: Opts = argh::from_env();
    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .init();
    std::process::exit(run(opts));
}

fn run(mut opts: Opts) -> i32 {
    let mut elog = ExecutionLog::new(&opts.instruction);

    let dfa_translator = CommandDfaTranslator {
        program: opts.ltlf2dfa.clone(),
    };
    let sas_runner = CommandSasRunner {
        program: opts.translator.clone(),
        timeout: Duration::from_secs(60),
    };
    let pipeline = Pipeline {
        dfa_translator: &dfa_translator,
        sas_runner: &sas_runner,
        opts: CompileOpts {
            search: SearchConfig {
                max_states: opts.max_states,
                max_depth: opts.max_depth,
                timeout: Some(Duration::from_secs(opts.timeout)),
            },
            refiner: opts.refiner,
        },
    };

    let init = match opts.init.as_deref().map(parse_facts).transpose() {
        Ok(init) => init,
        Err(e) => {
            eprintln!("error: {e:?}");
            return 1;
        }
    };

    let result = pipeline.compile(
        &opts.instruction,
        &opts.domain,
        opts.object_ids(),
        init.as_deref(),
        &mut elog,
    );

    let code = match result {
        Ok(library) => {
            match AgentSpeakBackend.run(&library, opts.output.clone()) {
                Ok(()) => {
                    elog.finish_success();
                    if elog.any_truncated() {
                        log::warn!(
                            "at least one exploration was truncated; the \
                             plan library may be partial"
                        );
                    }
                    0
                }
                Err(e) => {
                    elog.finish_failure(&e);
                    eprintln!("error: {e:?}");
                    1
                }
            }
        }
        Err(e) => {
            elog.finish_failure(&e);
            eprintln!("error: {e:?}");
            1
        }
    };

    if let Err(e) = elog.write(&mut opts.log) {
        eprintln!("warning: could not write execution log: {e:?}");
    }
    code
}
