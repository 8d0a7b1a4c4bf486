//! A module for the main application logic for the fracture analysis tool
use std::fs::{self, File};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::api;
use crate::config::{load_config, FatigueJob, RCurveJob};
use crate::expression::ExpressionCurve;
use crate::fatigue::{DrivingForce, FatigueIntegrator, GrowthPoint, ParisLaw};
use crate::material::{Material, Registry};
use crate::r_curve::{stability_diagram, DiagramPoint, InstabilityAnalyzer, PowerLawCurve, ResistanceCurve, Stability};
use crate::report;

const DEFAULT_YOUNGS_MODULUS: f64 = 200e9;

#[derive(Debug, Serialize)]
pub struct FatigueSummary {
    pub cycles: f64,
    pub curve: Vec<GrowthPoint>,
}

#[derive(Debug, Serialize)]
pub struct RCurveSummary {
    pub stability: Stability,
    pub diagram: Vec<DiagramPoint>,
}

/// Results of one job file.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub fatigue: Option<FatigueSummary>,
    pub r_curve: Option<RCurveSummary>,
}

fn run_fatigue(job: &FatigueJob) -> Result<FatigueSummary> {
    let law = ParisLaw::new(job.c, job.m)?;
    let force = DrivingForce::new(job.geometry_factor, job.stress_range_for_paris())?;
    let integrator = FatigueIntegrator::new(law);
    let cycles = integrator.cycles(&force, job.a_initial, job.a_final)?;
    let curve = integrator.growth_curve(&force, job.a_initial, job.a_final, job.curve_steps)?;
    info!(
        "fatigue: {:.0} cycles from a={} m to a={} m",
        cycles, job.a_initial, job.a_final
    );
    Ok(FatigueSummary { cycles, curve })
}

fn analyze_r_curve<R: ResistanceCurve>(curve: R, job: &RCurveJob, youngs_modulus: f64) -> Result<RCurveSummary> {
    let analyzer = InstabilityAnalyzer::new(curve).with_options(job.sweep);
    let stability = analyzer.analyze(job.initial_crack, youngs_modulus, job.geometry_factor)?;
    let diagram = match stability.critical() {
        Some(result) => stability_diagram(analyzer.curve(), result, job.diagram_points),
        None => Vec::new(),
    };
    Ok(RCurveSummary { stability, diagram })
}

fn run_r_curve(job: &RCurveJob, material: Option<&Material>) -> Result<RCurveSummary> {
    let youngs_modulus = job
        .youngs_modulus
        .or_else(|| material.map(|m| m.youngs_modulus))
        .unwrap_or(DEFAULT_YOUNGS_MODULUS);
    match &job.resistance {
        Some(expression) => {
            let curve = ExpressionCurve::new(expression, &job.parameters)?;
            analyze_r_curve(curve, job, youngs_modulus)
        }
        None => analyze_r_curve(PowerLawCurve::demo(), job, youngs_modulus),
    }
}

fn write_reports(directory: &Path, summary: &Summary) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory {}", directory.display()))?;
    if let Some(fatigue) = &summary.fatigue {
        let path = directory.join("growth_curve.csv");
        report::write_growth_curve(File::create(&path)?, &fatigue.curve)?;
        info!("wrote {}", path.display());
    }
    if let Some(r_curve) = &summary.r_curve {
        if !r_curve.diagram.is_empty() {
            let path = directory.join("stability_diagram.csv");
            report::write_stability_diagram(File::create(&path)?, &r_curve.diagram)?;
            info!("wrote {}", path.display());
        }
    }
    Ok(())
}

/// Loads, validates and runs a job file, writing reports when an output directory is set.
pub fn run(config_path: &str) -> Result<Summary> {
    info!("Running with configuration: {}", config_path);
    let conf = load_config(config_path)?;
    conf.validate()?;
    let material = conf.material()?;

    let fatigue = conf.fatigue.as_ref().map(run_fatigue).transpose()?;
    let r_curve = conf
        .r_curve
        .as_ref()
        .map(|job| run_r_curve(job, material.as_ref()))
        .transpose()?;
    let summary = Summary { fatigue, r_curve };

    if let Some(directory) = &conf.output.directory {
        write_reports(Path::new(directory), &summary)?;
    }
    Ok(summary)
}

/// Sends the JSON body stored at `body_path` to a request-layer route.
pub fn request(route: &str, body_path: Option<&str>) -> Result<Value> {
    let body = match body_path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read request body {}", path))?,
        None => "{}".to_string(),
    };
    api::handle(route, &body).map_err(|e| anyhow!("{}: {}", e, e.to_json()))
}

/// The material registry as JSON.
pub fn materials() -> Result<Value> {
    let registry = Registry::default();
    let materials = registry
        .names()
        .into_iter()
        .map(|name| registry.get(name).cloned())
        .collect::<Result<Vec<Material>>>()?;
    Ok(serde_json::to_value(materials)?)
}
