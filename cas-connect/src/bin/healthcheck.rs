use cas_connect::health;
use cas_connect::process::{ProcessSettings, ProcessTransport};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // healthcheck [engine-executable [args...]]
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(command) => ProcessSettings { command, args: args.collect() },
        None => ProcessSettings::default(),
    };

    let report = health::run(Box::new(ProcessTransport::new(settings)));
    for probe in &report.probes {
        match &probe.value {
            Some(value) => println!("ok   {} = {value}", probe.raw),
            None => println!("FAIL {} ({})", probe.raw, probe.errors),
        }
    }
    if !report.session_errors.is_empty() {
        eprintln!("{}", report.session_errors);
    }

    if report.ok {
        println!("CAS connection healthy");
    } else {
        eprintln!("CAS connection unhealthy; raw exchange follows");
        eprintln!("{}", report.debug);
        std::process::exit(1);
    }
}
