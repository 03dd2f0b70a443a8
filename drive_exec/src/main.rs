//! Main drive control executable entry point.
//!
//! # Architecture
//!
//! This executable replays a scripted drive through the motion-control
//! stack at a fixed nominal tick, standing in for the interactive input
//! devices and renderer which are external to this software:
//!
//!     - Initialise the session, logger and modules
//!     - Main loop, per tick:
//!         - Sample the drive script for the operator state
//!         - DriveCtrl processing (speed, wheels, pose integration)
//!         - Archive the output snapshot and status report
//!     - Save a run summary into the session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info};
use serde::Serialize;
use std::env;

// Internal
use drive_lib::{
    data_store::DataStore,
    drive_ctrl::InputData,
    script::DriveScript,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Nominal period of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Number of cycles between progress log lines.
const CYCLES_PER_LOG: u128 = 100;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a completed replay, saved into the session.
#[derive(Serialize)]
struct RunSummary {
    vehicle: String,
    duration_s: f64,
    num_cycles: u128,
    distance_travelled_m: f64,
    final_position_m: [f64; 3],
    final_heading_rad: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Art Car Drive Control Executable\n");
    info!("Running on: {}", host::get_platform_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD DRIVE SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path, otherwise
    // fall back to the demo drive shipped with the parameters.
    let script = if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);
        DriveScript::from_file(&args[1]).wrap_err("Failed to load script")?
    } else if args.len() == 1 {
        info!("No script provided, replaying the demo drive");

        let mut path = host::get_artcar_sw_root()
            .wrap_err("Cannot locate the software root")?;
        path.push("params");
        path.push("demo_drive.toml");

        DriveScript::from_file(&path).wrap_err("Failed to load the demo drive")?
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    };

    info!(
        "Loaded script lasts {:.02} s and contains {} keyframes\n",
        script.duration_s(),
        script.keyframes.len()
    );

    // ---- INITIALISE DATASTORE AND MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.drive_ctrl
        .init("vehicles.toml", &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning replay\n");

    let num_cycles = (script.duration_s() / CYCLE_PERIOD_S).ceil() as u128;
    let mut distance_travelled_m = 0.0;
    let mut last_position_m: Option<[f64; 3]> = None;

    while ds.num_cycles < num_cycles {
        // Sample the operator state from the script
        let keyframe = script.sample(ds.sim_time_s);
        ds.drive_ctrl_input = InputData {
            operator_xy: [keyframe.x, keyframe.y],
            braking_factor: keyframe.braking_factor,
            delta_time_s: CYCLE_PERIOD_S,
            ..InputData::default()
        };

        // Drive control processing
        let (snapshot, report) = ds
            .drive_ctrl
            .proc(&ds.drive_ctrl_input)
            .wrap_err("DriveCtrl processing failed")?;

        // Accumulate the horizontal distance covered
        if let Some(last) = last_position_m {
            let dx = snapshot.position_m[0] - last[0];
            let dy = snapshot.position_m[1] - last[1];
            distance_travelled_m += (dx * dx + dy * dy).sqrt();
        }
        last_position_m = Some(snapshot.position_m);

        ds.drive_snapshot = Some(snapshot);
        ds.drive_status_rpt = report;

        // Archive this cycle
        if let Err(e) = ds.drive_ctrl.write() {
            return Err(eyre!("Failed to write archives: {}", e));
        }

        if ds.num_cycles % CYCLES_PER_LOG == 0 {
            info!(
                "t = {:5.1} s: pos ({:7.2}, {:7.2}) m, speed {:5.2} m/s, heading {:6.1} deg",
                ds.sim_time_s,
                snapshot.position_m[0],
                snapshot.position_m[1],
                snapshot.body_speed_ms,
                snapshot.heading_rad.to_degrees()
            );
        }

        ds.num_cycles += 1;
        ds.sim_time_s += CYCLE_PERIOD_S;
    }

    // ---- SUMMARY ----

    info!(
        "\nReplay complete: {:.1} m covered over {:.1} s ({} cycles)",
        distance_travelled_m, ds.sim_time_s, ds.num_cycles
    );

    let summary = RunSummary {
        vehicle: String::from(ds.drive_ctrl.vehicle_name().unwrap_or("unknown")),
        duration_s: ds.sim_time_s,
        num_cycles: ds.num_cycles,
        distance_travelled_m,
        final_position_m: ds
            .drive_snapshot
            .map(|s| s.position_m)
            .unwrap_or([0.0, 0.0, 0.0]),
        final_heading_rad: ds.drive_snapshot.map(|s| s.heading_rad).unwrap_or(0.0),
    };
    session.save("run_summary.json", summary);

    session.exit();

    Ok(())
}
