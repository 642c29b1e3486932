//! Extract profiles, point values and budget pie charts of
//! averaged convection fields.
//!
//! ```text
//! rustpost -c case_ra_1e8.dat -b bud_k.dat -q qty_t.dat qty_tt.dat -x 0.1 0.5 --xypie 0.1 0.5
//! ```
use anyhow::{bail, Result};
use clap::Parser;
use rustpost::{write_profiles, Budget, Evaluator, GridCase, Profile, Quantity};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rustpost")]
#[command(about = "Extract and export turbulent quantities and budgets")]
struct Args {
    /// Parameter file for the case
    #[arg(short, long)]
    case: PathBuf,

    /// Parameter file(s) for each budget to process
    #[arg(short, long, num_args = 1..)]
    budget: Vec<PathBuf>,

    /// Parameter file(s) for each quantity to process
    #[arg(short, long, num_args = 1..)]
    quantity: Vec<PathBuf>,

    /// Profiles along y at given x location(s)
    #[arg(short, num_args = 1..)]
    x: Vec<f64>,

    /// Profiles along x at given y location(s)
    #[arg(short, num_args = 1..)]
    y: Vec<f64>,

    /// Profiles along y at given i node(s)
    #[arg(short, num_args = 1..)]
    i: Vec<usize>,

    /// Profiles along x at given j node(s)
    #[arg(short, num_args = 1..)]
    j: Vec<usize>,

    /// Print values at given x,y location
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    xyval: Option<Vec<f64>>,

    /// Print values at given i,j node
    #[arg(long, num_args = 2, value_names = ["I", "J"])]
    ijval: Option<Vec<usize>>,

    /// Print budget pie chart at given x,y location
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    xypie: Option<Vec<f64>>,

    /// Print budget pie chart at given i,j node
    #[arg(long, num_args = 2, value_names = ["I", "J"])]
    ijpie: Option<Vec<usize>>,

    /// Folder for the profile files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Write evaluated quantities as raw binary fields
    #[arg(long)]
    dump: bool,

    /// Evaluate every definition file at most once
    #[arg(long)]
    cache: bool,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_parser = Level::from_str)]
    log_level: Level,
}

/// Cuts shared by quantities and budgets
trait Extract {
    fn cut_x(&self, x: f64) -> rustpost::Result<Vec<Profile>>;
    fn cut_y(&self, y: f64) -> rustpost::Result<Vec<Profile>>;
    fn cut_i(&self, i: usize) -> rustpost::Result<Vec<Profile>>;
    fn cut_j(&self, j: usize) -> rustpost::Result<Vec<Profile>>;
    fn at_xy(&self, x: f64, y: f64) -> rustpost::Result<Vec<(String, f64)>>;
    fn at_ij(&self, i: usize, j: usize) -> rustpost::Result<Vec<(String, f64)>>;
}

impl Extract for Quantity<'_> {
    fn cut_x(&self, x: f64) -> rustpost::Result<Vec<Profile>> {
        Ok(vec![self.profile_x(x)?])
    }
    fn cut_y(&self, y: f64) -> rustpost::Result<Vec<Profile>> {
        Ok(vec![self.profile_y(y)?])
    }
    fn cut_i(&self, i: usize) -> rustpost::Result<Vec<Profile>> {
        Ok(vec![self.profile_i(i)?])
    }
    fn cut_j(&self, j: usize) -> rustpost::Result<Vec<Profile>> {
        Ok(vec![self.profile_j(j)?])
    }
    fn at_xy(&self, x: f64, y: f64) -> rustpost::Result<Vec<(String, f64)>> {
        Ok(vec![(self.name.clone(), self.value_xy(x, y)?)])
    }
    fn at_ij(&self, i: usize, j: usize) -> rustpost::Result<Vec<(String, f64)>> {
        Ok(vec![(self.name.clone(), self.value_ij(i, j)?)])
    }
}

impl Extract for Budget<'_> {
    fn cut_x(&self, x: f64) -> rustpost::Result<Vec<Profile>> {
        self.profiles_x(x)
    }
    fn cut_y(&self, y: f64) -> rustpost::Result<Vec<Profile>> {
        self.profiles_y(y)
    }
    fn cut_i(&self, i: usize) -> rustpost::Result<Vec<Profile>> {
        self.profiles_i(i)
    }
    fn cut_j(&self, j: usize) -> rustpost::Result<Vec<Profile>> {
        self.profiles_j(j)
    }
    fn at_xy(&self, x: f64, y: f64) -> rustpost::Result<Vec<(String, f64)>> {
        self.values_xy(x, y)
    }
    fn at_ij(&self, i: usize, j: usize) -> rustpost::Result<Vec<(String, f64)>> {
        self.values_ij(i, j)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        Level::DEBUG
    } else {
        args.log_level
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.budget.is_empty() && args.quantity.is_empty() {
        bail!("at least one quantity or budget must be provided");
    }

    let case = GridCase::from_file(&args.case)?;
    debug!("\n{}", case);
    std::fs::create_dir_all(&args.output)?;

    let mut evaluator = if args.cache {
        Evaluator::with_cache(&case)
    } else {
        Evaluator::new(&case)
    };

    info!("Number of budget(s): {}", args.budget.len());
    for config in &args.budget {
        info!("Processing {:?}", config);
        let budget = Budget::with_evaluator(&mut evaluator, config)?;
        debug!("\n{}", budget);
        let name = stem(config);
        extract(&args, &budget, &name)?;
        if let Some(xy) = &args.xypie {
            println!("{}, xypie at ({}, {}):\n{}", name, xy[0], xy[1], budget.pie_xy(xy[0], xy[1])?);
        }
        if let Some(ij) = &args.ijpie {
            println!("{}, ijpie at ({}, {}):\n{}", name, ij[0], ij[1], budget.pie_ij(ij[0], ij[1])?);
        }
        if args.dump {
            for (k, term) in budget.terms.iter().enumerate() {
                term.write_binary(args.output.join(format!("{}_term{}.bin", name, k)))?;
            }
        }
    }

    info!("Number of quantitie(s): {}", args.quantity.len());
    for config in &args.quantity {
        info!("Processing {:?}", config);
        let qty = evaluator.evaluate(config)?;
        debug!("\n{}", qty);
        let name = stem(config);
        extract(&args, &qty, &name)?;
        if args.dump {
            qty.write_binary(args.output.join(format!("{}.bin", name)))?;
        }
    }

    Ok(())
}

/// Write profiles and print values requested on the command line
fn extract<E: Extract>(args: &Args, item: &E, name: &str) -> Result<()> {
    for x in &args.x {
        save(args, &item.cut_x(*x)?, &format!("{}_xplot_x_{}", name, x))?;
    }
    for y in &args.y {
        save(args, &item.cut_y(*y)?, &format!("{}_yplot_y_{}", name, y))?;
    }
    for i in &args.i {
        save(args, &item.cut_i(*i)?, &format!("{}_iplot_i_{}", name, i))?;
    }
    for j in &args.j {
        save(args, &item.cut_j(*j)?, &format!("{}_jplot_j_{}", name, j))?;
    }
    if let Some(xy) = &args.xyval {
        for (label, v) in item.at_xy(xy[0], xy[1])? {
            println!("{}, xyval, {}: {:e}", name, label, v);
        }
    }
    if let Some(ij) = &args.ijval {
        for (label, v) in item.at_ij(ij[0], ij[1])? {
            println!("{}, ijval, {}: {:e}", name, label, v);
        }
    }
    Ok(())
}

fn save(args: &Args, profiles: &[Profile], name: &str) -> Result<()> {
    let path = args.output.join(format!("{}.dat", name));
    write_profiles(&path, profiles)?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// Definition file name without extension
fn stem(config: &Path) -> String {
    config
        .file_stem()
        .map_or_else(|| config.display().to_string(), |s| s.to_string_lossy().into_owned())
}
