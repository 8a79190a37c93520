use clap::Parser;
use color_eyre::eyre::eyre;
use log::info;

use junction_rs::{BayesNet, MarginCalculator};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Length of the chain X0 -> X1 -> ... (at least 1).
    #[arg(value_name = "INT", default_value = "3")]
    n: usize,

    /// Probability that a variable copies its parent's value.
    #[clap(long, value_name = "FLOAT", default_value = "0.8")]
    agreement: f64,

    /// Observation in the form `NAME=VALUE` (may be repeated).
    #[clap(long = "evidence", value_name = "NAME=VALUE")]
    evidence: Vec<String>,

    /// Print the junction tree structure.
    #[clap(long)]
    tree: bool,
}

fn build_chain(n: usize, agreement: f64) -> color_eyre::Result<BayesNet> {
    let mut net = BayesNet::new();
    let mut prev = None;
    for i in 0..n {
        let v = net.add_variable(format!("X{}", i), 2);
        if let Some(p) = prev {
            let q = 1.0 - agreement;
            net.set_cpt(v, &[p], vec![agreement, q, q, agreement])?;
        }
        prev = Some(v);
    }
    Ok(net)
}

fn parse_evidence(net: &BayesNet, s: &str) -> color_eyre::Result<(usize, usize)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| eyre!("expected NAME=VALUE, got '{}'", s))?;
    let variable = net
        .variable(name.trim())
        .ok_or_else(|| eyre!("unknown variable '{}'", name))?;
    let value = value.trim().parse::<usize>()?;
    Ok((variable, value))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    if args.n == 0 {
        return Err(eyre!("chain must have at least one variable"));
    }
    let net = build_chain(args.n, args.agreement)?;
    print!("{}", net);

    let observations = args
        .evidence
        .iter()
        .map(|s| parse_evidence(&net, s))
        .collect::<color_eyre::Result<Vec<_>>>()?;

    let mut engine = MarginCalculator::new(net);
    let mut margins = engine.process_model()?;
    if args.tree {
        if let Some(tree) = engine.tree() {
            print!("{}", tree.summary());
        }
    }
    println!("Prior margins:");
    print!("{}", margins);

    for (variable, value) in observations {
        info!("Observing {} = {}", engine.model().name(variable), value);
        margins = engine.set_evidence(variable, value)?;
    }
    if !engine.evidence().iter().all(Option::is_none) {
        println!("Posterior margins:");
        print!("{}", margins);
    }

    println!("\nPer-clique view:");
    print!("{}", engine);

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
