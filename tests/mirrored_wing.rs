use approx::assert_relative_eq;
use vlm_solver::geometry::Sheet;
use vlm_solver::math::{self, Vec as LatVec};
use vlm_solver::prelude::*;

// Tapered wing, 8 m span, root chord 1 m, tip chord 0.5 m.
// Aileron hinged at mid chord over the whole half span.
fn build_tapered_wing(bnum: usize, cnum: usize) -> LatticeSystem {
    let mut model = LatticeModel::new("Tapered");
    model
        .add_surface(
            Surface::new("Wing")
                .mirrored()
                .with_chordwise(cnum, Spacing::Equal)
                .with_section(
                    Section::new(0.0, 0.0, 0.0, 1.0)
                        .with_spacing(bnum, Spacing::Equal)
                        .with_cdo(0.01)
                        .with_control("aileron", Control::new(0.5).reversed()),
                )
                .with_section(Section::new(0.25, 4.0, 0.0, 0.5).with_cdo(0.01)),
        )
        .unwrap();
    model.build().unwrap()
}

#[test]
fn test_sheet_geometry() {
    let system = build_tapered_wing(5, 4);
    let sheets: Vec<&Sheet> = system.sheets().collect();
    assert_eq!(sheets.len(), 2);
    assert!(sheets[0].mirror);
    assert!(!sheets[1].mirror);

    for sheet in &sheets {
        assert_relative_eq!(sheet.width, 4.0, epsilon = 1e-12);
        assert_relative_eq!(sheet.area, 3.0, epsilon = 1e-12);
        assert_eq!(sheet.strips.len(), 5);
        let width: f64 = sheet.strips.iter().map(|s| s.width).sum();
        assert_relative_eq!(width, sheet.width, epsilon = 1e-12);
        assert_eq!(sheet.panel_ids.len(), 20);
    }

    let refs = &system.references;
    assert_relative_eq!(refs.sref, 6.0, epsilon = 1e-12);
    assert_relative_eq!(refs.bref, 8.0, epsilon = 1e-12);
    assert_relative_eq!(refs.cref, 0.75, epsilon = 1e-12);
}

#[test]
fn test_control_membership() {
    let system = build_tapered_wing(5, 4);
    for sheet in system.sheets() {
        let aileron = &sheet.controls["aileron"];
        assert_eq!(aileron.is_mirror(), sheet.mirror);
        // Panels ending at 0.5, 0.75 and 1.0 of the chord belong to the aileron
        assert_eq!(aileron.panels().len(), 15);
        for &id in aileron.panels() {
            let panel = system.panel(id).unwrap();
            assert!(panel.station.trailing >= 0.5);
            assert!(sheet.panel_ids.contains(&id));
        }
    }
}

#[test]
fn test_mirrored_wing_loads_symmetrically() {
    let system = build_tapered_wing(6, 4);
    let mut result = LatticeResult::new("Alpha", &system).unwrap();
    result.set_state(FlightState::new(5.0, 0.0)).unwrap();

    let strips = result.strip_forces();
    let n = strips.len();
    assert_eq!(n, 12);
    for i in 0..n / 2 {
        assert_relative_eq!(strips[i].lift, strips[n - 1 - i].lift, max_relative = 1e-9);
    }

    let coeffs = result.coefficients();
    assert!(coeffs.cl > 0.0);
    assert_relative_eq!(coeffs.cy, 0.0, epsilon = 1e-10);
    assert_relative_eq!(coeffs.cl_roll, 0.0, epsilon = 1e-10);
    assert_relative_eq!(coeffs.cn, 0.0, epsilon = 1e-10);
    // Parasite drag uses the full loaded area
    assert_relative_eq!(coeffs.cdo, 0.01, max_relative = 1e-9);
}

#[test]
fn test_aileron_rolls_antisymmetrically() {
    let system = build_tapered_wing(6, 4);
    let mut result = LatticeResult::new("Roll", &system).unwrap();
    result.set_controls(&[("aileron", 10.0)]).unwrap();

    let strips = result.strip_forces();
    let n = strips.len();
    for i in 0..n / 2 {
        assert_relative_eq!(strips[i].lift, -strips[n - 1 - i].lift, epsilon = 1e-12, max_relative = 1e-9);
    }
    let coeffs = result.coefficients();
    assert_relative_eq!(coeffs.cl, 0.0, epsilon = 1e-10);
    assert!(coeffs.cl_roll.abs() > 1e-3);
}

#[test]
fn test_cached_factorization_matches_fresh_solve() {
    let system = build_tapered_wing(6, 4);
    let n = system.num_panels();
    let rhs = LatVec::from_fn(n, |i, _| ((i % 7) as f64) - 3.0);

    let cached = system.solve(&rhs).unwrap();
    let fresh = math::solve_linear_system(system.influence_matrix(), &rhs).unwrap();
    assert_eq!(cached, fresh);

    // Repeated solves reuse the same factor
    assert_eq!(system.solve(&rhs).unwrap(), cached);
}

#[test]
fn test_rebuild_after_edit_leaves_old_system_untouched() {
    let mut model = LatticeModel::new("Edit");
    model
        .add_surface(
            Surface::new("Wing")
                .mirrored()
                .with_section(Section::new(0.0, 0.0, 0.0, 1.0).with_spacing(4, Spacing::Equal))
                .with_section(Section::new(0.0, 4.0, 0.0, 1.0)),
        )
        .unwrap();
    let before = model.build().unwrap();

    model
        .surface_mut("Wing")
        .unwrap()
        .add_section(Section::new(0.0, 6.0, 0.0, 0.5));
    let after = model.build().unwrap();

    assert_eq!(before.num_strips(), 8);
    assert!(after.num_strips() > before.num_strips());
    assert!(after.references.sref > before.references.sref);
}

// Wing panels from |y| = 1 to 5 m, joined across the centre by a sheet that
// carries vortices but no load, or left open as two separate surfaces.
fn build_wing_with_centre(centre: bool) -> LatticeSystem {
    let mut model = LatticeModel::new("Centre");
    if centre {
        model
            .add_surface(
                Surface::new("Wing")
                    .mirrored()
                    .with_chordwise(4, Spacing::Equal)
                    .with_section(
                        Section::new(0.0, 0.0, 0.0, 1.0)
                            .with_spacing(2, Spacing::Equal)
                            .with_cdo(0.02)
                            .noload(),
                    )
                    .with_section(
                        Section::new(0.0, 1.0, 0.0, 1.0)
                            .with_spacing(6, Spacing::Cosine)
                            .with_cdo(0.01),
                    )
                    .with_section(Section::new(0.0, 5.0, 0.0, 1.0).with_cdo(0.01)),
            )
            .unwrap();
    } else {
        for (name, y1, y2) in [("Left", -5.0, -1.0), ("Right", 1.0, 5.0)] {
            model
                .add_surface(
                    Surface::new(name)
                        .with_chordwise(4, Spacing::Equal)
                        .with_section(
                            Section::new(0.0, y1, 0.0, 1.0)
                                .with_spacing(6, Spacing::Cosine)
                                .with_cdo(0.01),
                        )
                        .with_section(Section::new(0.0, y2, 0.0, 1.0).with_cdo(0.01)),
                )
                .unwrap();
        }
    }
    model.build().unwrap()
}

#[test]
fn test_noload_sheet_carries_circulation_without_force() {
    let joined = build_wing_with_centre(true);
    let open = build_wing_with_centre(false);
    // Reference area counts loaded sheets only
    assert_relative_eq!(joined.references.sref, open.references.sref, epsilon = 1e-12);
    assert_relative_eq!(joined.references.sref, 8.0, epsilon = 1e-12);

    let mut with_centre = LatticeResult::new("Joined", &joined).unwrap();
    with_centre.set_state(FlightState::new(5.0, 0.0)).unwrap();
    let mut without_centre = LatticeResult::new("Open", &open).unwrap();
    without_centre.set_state(FlightState::new(5.0, 0.0)).unwrap();

    let noload: Vec<usize> = joined.strips().filter(|s| s.noload).map(|s| s.id).collect();
    assert_eq!(noload.len(), 4);
    for &id in &noload {
        let forces = &with_centre.strip_forces()[id];
        assert_eq!(forces.force.norm(), 0.0);
        assert_eq!(forces.lift, 0.0);
        assert_eq!(forces.parasite, 0.0);
        assert!(with_centre.strip_circulation()[id].abs() > 1e-6);
    }

    // The bound vortices across the centre change the loading next to it
    let inboard = |system: &LatticeSystem| {
        system
            .strips()
            .filter(|s| !s.noload && s.mid.point.y > 0.0)
            .min_by(|a, b| a.mid.point.y.total_cmp(&b.mid.point.y))
            .map(|s| s.id)
            .unwrap()
    };
    let joined_gamma = with_centre.strip_circulation()[inboard(&joined)];
    let open_gamma = without_centre.strip_circulation()[inboard(&open)];
    assert!(joined_gamma > open_gamma);
    assert!((joined_gamma - open_gamma).abs() > 1e-3 * open_gamma.abs());

    // Lift and parasite drag come from the loaded strips alone
    let loaded_lift: f64 = with_centre.strip_forces().iter().map(|s| s.lift).sum();
    assert_relative_eq!(loaded_lift, with_centre.lift(), max_relative = 1e-12);
    assert_relative_eq!(with_centre.coefficients().cdo, 0.01, max_relative = 1e-9);
}
