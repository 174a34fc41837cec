use anyhow::{bail, Context};
use clap::Parser;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use amdenergy::config::DEV_CPU_ENV;
use amdenergy::metrics::energy::CounterKind;
use amdenergy::{EnergyComponent, EnergyConfig, EnumModifier, EventCode};
use amdenergy_raw::msr::{device_path, MSR_DEVICE, MSR_SAFE_DEVICE};

#[derive(Parser, Debug)]
#[command(name = "amdenergy")]
#[command(about = "RAPL energy counters for AMD family 17h CPUs")]
struct Args {
    #[arg(long, help = "List every native event and exit")]
    list: bool,

    #[arg(
        long = "event",
        help = "Event to measure (can be specified multiple times, default: every PACKAGE_ENERGY and PP0_ENERGY event)",
        action = clap::ArgAction::Append
    )]
    events: Vec<String>,

    #[arg(long, default_value_t = 1.0, help = "Seconds between reads")]
    interval: f64,

    #[arg(long, default_value_t = 5, help = "Number of reads before stopping")]
    samples: u32,

    #[arg(
        short,
        long,
        help = "Enable verbose logging (shows every register read)"
    )]
    verbose: bool,
}

fn check_permissions(dev_root: &Path) {
    let safe_path = device_path(dev_root, 0, MSR_SAFE_DEVICE);
    let msr_path = device_path(dev_root, 0, MSR_DEVICE);

    if std::fs::metadata(&safe_path).is_err() && std::fs::metadata(&msr_path).is_err() {
        eprintln!(
            "\nERROR: Neither {} nor {} exists\n\nThe MSR kernel module may not be loaded.\nRun: sudo modprobe msr\n",
            safe_path.display(),
            msr_path.display()
        );
        std::process::exit(1);
    }

    let readable = std::fs::File::open(&safe_path).is_ok() || std::fs::File::open(&msr_path).is_ok();
    if !readable {
        eprintln!(
            "\nERROR: Permission denied accessing {}\n\nRun as root, grant CAP_SYS_RAWIO, or set {} to an accessible device tree.\n",
            msr_path.display(),
            DEV_CPU_ENV
        );
        std::process::exit(1);
    }
}

fn list_events(component: &EnergyComponent) -> anyhow::Result<()> {
    let mut next = component.enum_events(0, EnumModifier::First).ok();
    while let Some(code) = next {
        let info = component.code_to_info(code)?;
        println!(
            "{:>4}  {:<32} {:<3} {}",
            code, info.symbol, info.units, info.long_descr
        );
        next = component.enum_events(code, EnumModifier::Next).ok();
    }
    Ok(())
}

fn selected_events(component: &EnergyComponent, names: &[String]) -> anyhow::Result<Vec<EventCode>> {
    if names.is_empty() {
        let catalog = component.registry()?.catalog();
        return Ok(catalog
            .iter()
            .filter(|event| event.kind == CounterKind::ConvertedEnergy)
            .map(|event| event.code())
            .collect());
    }

    names
        .iter()
        .map(|name| {
            component
                .name_to_code(name)
                .with_context(|| format!("Unknown event {name}, see --list"))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = EnergyConfig::from_env();
    check_permissions(&config.dev_cpu_root);

    let identity = config.identity();
    tracing::info!(
        "Detected {} CPU family 0x{:x} model 0x{:x}",
        identity.vendor.name(),
        identity.family,
        identity.model
    );

    let mut component = EnergyComponent::init_component(&config);
    if !component.is_enabled() {
        bail!("{} is disabled: {}", component.info().name, component.info().disabled_reason);
    }

    if args.list {
        list_events(&component)?;
        component.shutdown_component()?;
        return Ok(());
    }

    if !args.interval.is_finite() || args.interval < 0.0 {
        bail!("--interval must be a non-negative number of seconds");
    }

    let codes = selected_events(&component, &args.events)?;
    let mut context = component.init_control_state()?;
    component.update_control_state(&mut context, &codes)?;

    tracing::info!(
        "Measuring {} events, {} samples every {}s",
        codes.len(),
        args.samples,
        args.interval
    );

    component.start(&mut context)?;
    for sample in 1..=args.samples {
        thread::sleep(Duration::from_secs_f64(args.interval));

        let counts = component.read(&mut context)?;
        for &code in &codes {
            println!(
                "{:>4} {:<32} {:>20} {}",
                sample,
                component.code_to_name(code)?,
                counts[code as usize],
                component.code_to_info(code)?.units
            );
        }
    }
    component.stop(&mut context)?;

    component.shutdown_thread()?;
    component.shutdown_component()?;
    tracing::info!("Measurement complete");

    Ok(())
}
