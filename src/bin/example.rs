//! VLM Solver Example - Wing and Tail

use anyhow::Context;
use vlm_solver::prelude::*;

fn build_model() -> VlmResult<LatticeModel> {
    let mut model = LatticeModel::new("Trainer");

    // Tapered wing, 10 m span, cambered root, ailerons and flaps
    //
    //   y=0 ========== y=2 ---------- y=5
    //       flap            aileron
    //
    model.add_surface(
        Surface::new("Wing")
            .mirrored()
            .with_chordwise(6, Spacing::Cosine)
            .with_section(
                Section::new(0.0, 0.0, 0.0, 1.4)
                    .with_spacing(6, Spacing::Cosine)
                    .with_airfoil(Airfoil::naca4("2412")?)
                    .with_cdo(0.008)
                    .with_control("flap", Control::new(0.75)),
            )
            .with_section(
                Section::new(0.1, 2.0, 0.1, 1.2)
                    .with_spacing(8, Spacing::Cosine)
                    .with_airfoil(Airfoil::naca4("2412")?)
                    .with_cdo(0.008)
                    .with_control("aileron", Control::new(0.75).reversed()),
            )
            .with_section(
                Section::new(0.3, 5.0, 0.4, 0.8)
                    .with_twist(-2.0)
                    .with_cdo(0.008),
            ),
    )?;

    // Horizontal tail with an elevator
    model.add_surface(
        Surface::new("Tail")
            .mirrored()
            .with_chordwise(4, Spacing::Equal)
            .with_section(
                Section::new(4.5, 0.0, 0.3, 0.7)
                    .with_spacing(6, Spacing::Cosine)
                    .with_cdo(0.01)
                    .with_control("elevator", Control::new(0.6)),
            )
            .with_section(Section::new(4.7, 1.6, 0.3, 0.5).with_cdo(0.01)),
    )?;

    model.set_cg(0.45, 0.0, 0.0);
    Ok(model)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== VLM Solver Example: Wing and Tail ===\n");

    let model = build_model().context("Failed to describe model")?;
    let system = model.build().context("Failed to build lattice")?;

    println!(
        "Lattice: {} strips, {} panels",
        system.num_strips(),
        system.num_panels()
    );
    let refs = &system.references;
    println!(
        "References: Sref = {:.3}, bref = {:.3}, cref = {:.3}\n",
        refs.sref, refs.bref, refs.cref
    );

    // Plain solve
    let mut result = LatticeResult::new("Cruise", &system)?;
    result.set_state(FlightState::new(4.0, 0.0).with_speed(30.0).with_density(1.225))?;
    print_coefficients("Cruise at 4 deg", &result.coefficients());
    println!("Span efficiency: {:.4}\n", result.efficiency());

    // Trim to CL = 0.6 with zero pitching moment
    let mut trim = LatticeTrim::from_result(result.clone());
    trim.set_targets(0.6, 0.0, 0.0, 0.0, 0.0)?;
    let options = IterationOptions::default()
        .with_tolerance(1e-8)
        .with_max_iter(25)
        .with_logging();
    let report = trim.trim_with(&options)?;
    println!(
        "Trim {} after {} iterations: alpha = {:.3} deg, residual = {:.2e}",
        if report.converged { "converged" } else { "stopped" },
        report.iterations,
        report.alpha,
        report.residual
    );
    for (name, deflection) in &report.controls {
        println!("  {:<10} {:>8.3} deg", name, deflection);
    }
    print_coefficients("Trimmed", &trim.result().coefficients());

    // Minimum induced drag loading for the trimmed lift, then the twist for it
    let trimmed = trim.into_result();
    let lift = trimmed.lift();
    let mut optimum = LatticeOptimum::from_result(trimmed);
    optimum.add_record("root bending", RecordKind::BendingMoment, StripSelection::Surface("Wing".to_string()))?;
    let baseline = optimum.return_induced_drag();
    let drag = optimum.optimum_lift_distribution(lift, &[])?;
    println!(
        "\nInduced drag: trimmed {:.4} N, optimum {:.4} N (root bending {:.2} N m)",
        baseline,
        drag,
        optimum.record_value("root bending")?
    );

    let twist = optimum.optimum_strip_twist(1e-6)?;
    println!(
        "Twist iteration {} in {} steps",
        if twist.converged { "converged" } else { "stopped" },
        twist.iterations
    );

    println!("\n=== Analysis Complete ===");
    Ok(())
}

fn print_coefficients(label: &str, c: &Coefficients) {
    println!("{}:", label);
    println!("  CL  = {:>9.5}  CY = {:>9.5}", c.cl, c.cy);
    println!("  Cl  = {:>9.5}  Cm = {:>9.5}  Cn = {:>9.5}", c.cl_roll, c.cm, c.cn);
    println!("  CDi = {:>9.5}  CDo = {:>9.5}", c.cdi, c.cdo);
}
