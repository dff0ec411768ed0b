use std::str::FromStr;

use rstest::*;

use crate::{
    prelude::{
        Config, Duration, EphemerisTimeline, Epoch, EpochState, Error, Kepler, ObservationTable,
        Output, Pipeline, RawObservation, SatelliteStateProvider, SolverOpts, Vector3,
        SPEED_OF_LIGHT_M_S, SV,
    },
    tests::{
        gps_ephemeris, init_logger, observation_table, FailingSolver, FixedSolver, StaticStates,
        G01, G02, G03, G04, G05, G06,
    },
};

const FIXED_POSITION: (f64, f64, f64) = (4.0E6, 5.0E5, 4.9E6);

fn t(k: usize) -> Epoch {
    Epoch::from_str("2020-06-25T12:00:00 GPST").unwrap() + Duration::from_seconds(30.0 * k as f64)
}

fn timeline(svs: &[SV]) -> EphemerisTimeline {
    svs.iter()
        .map(|sv| (t(0), gps_ephemeris(*sv, t(0))))
        .collect()
}

fn fixed_position() -> Vector3<f64> {
    Vector3::new(FIXED_POSITION.0, FIXED_POSITION.1, FIXED_POSITION.2)
}

/// Five satellites tracked at t0, t1, t2 by both receivers.
/// G03 local lock counter changes between t1 and t2.
#[fixture]
fn scenario() -> (EphemerisTimeline, ObservationTable, ObservationTable) {
    let svs = [G01, G02, G03, G04, G05];

    let mut local = Vec::new();
    let mut remote = Vec::new();

    for k in 0..3 {
        for sv in svs.iter() {
            let prn = sv.prn as f64;
            let pr = 2.0E7 + prn;
            let phase = 1.0E3 * prn + 10.0 * k as f64;

            let lock = if *sv == G03 && k == 2 { 2.0 } else { 1.0 };

            local.push((t(k), *sv, RawObservation::new(pr, phase, 45.0, lock)));
            remote.push((
                t(k),
                *sv,
                RawObservation::new(pr + 5.0, phase + 0.5, 40.0, 1.0),
            ));
        }
    }

    (
        timeline(&svs),
        observation_table(local),
        observation_table(remote),
    )
}

fn fixed_pipeline() -> Pipeline<StaticStates, FixedSolver> {
    Pipeline::with_capabilities(
        &Config::default(),
        StaticStates::default(),
        FixedSolver::new(fixed_position()),
    )
}

#[rstest]
fn cycle_slip_scenario(scenario: (EphemerisTimeline, ObservationTable, ObservationTable)) {
    init_logger();

    let (ephemerides, local, remote) = scenario;
    let output = fixed_pipeline().run(ephemerides, &local, &remote).unwrap();

    assert_eq!(output.len(), 3);

    let at_t0 = output.sdiffs.get(&t(0)).unwrap();
    let at_t1 = output.sdiffs.get(&t(1)).unwrap();
    let at_t2 = output.sdiffs.get(&t(2)).unwrap();

    assert_eq!(at_t0.keys().copied().collect::<Vec<_>>(), vec![G01, G02, G03, G04, G05]);
    assert_eq!(at_t1.keys().copied().collect::<Vec<_>>(), vec![G01, G02, G03, G04, G05]);
    assert_eq!(at_t2.keys().copied().collect::<Vec<_>>(), vec![G01, G02, G04, G05]);

    let g03 = at_t1.get(&G03).unwrap();
    assert_eq!(g03.sv, G03);
    assert_eq!(g03.pseudorange, 5.0);
    assert_eq!(g03.phase, 0.5);
    assert_eq!(g03.snr, 40.0);
    assert!(g03.doppler.is_nan());
    assert!(g03.is_usable());

    // no Doppler on first epoch
    assert!(output.local_ecef.get(&t(0)).unwrap().iter().all(|v| v.is_nan()));
    assert!(output.remote_ecef.get(&t(0)).unwrap().iter().all(|v| v.is_nan()));

    for k in 1..3 {
        assert_eq!(output.local_ecef.get(&t(k)), Some(&fixed_position()));
        assert_eq!(output.remote_ecef.get(&t(k)), Some(&fixed_position()));
    }
}

#[rstest]
fn missing_ephemeris(scenario: (EphemerisTimeline, ObservationTable, ObservationTable)) {
    let (ephemerides, mut local, remote) = scenario;

    local
        .get_mut(&t(1))
        .unwrap()
        .insert(G06, RawObservation::new(2.0E7, 1.0E3, 45.0, 1.0));

    assert_eq!(
        fixed_pipeline().run(ephemerides, &local, &remote),
        Err(Error::MissingEphemeris(G06))
    );
}

#[rstest]
fn solver_error_propagates(scenario: (EphemerisTimeline, ObservationTable, ObservationTable)) {
    let (ephemerides, local, remote) = scenario;

    let pipeline = Pipeline::with_capabilities(
        &Config::default(),
        StaticStates::default(),
        FailingSolver::default(),
    );

    assert_eq!(
        pipeline.run(ephemerides, &local, &remote),
        Err(Error::PvtDivergence)
    );
}

#[test]
fn single_leg_is_not_trusted() {
    let ephemerides = timeline(&[G01, G02]);

    let local = observation_table([
        (t(0), G01, RawObservation::new(2.0E7, 1.0E3, 45.0, 1.0)),
        (t(0), G02, RawObservation::new(2.1E7, 2.0E3, 45.0, 1.0)),
    ]);

    let remote = observation_table([(t(0), G01, RawObservation::new(2.0E7, 1.0E3, 45.0, 1.0))]);

    let output = fixed_pipeline().run(ephemerides, &local, &remote).unwrap();
    let sdiffs = output.sdiffs.get(&t(0)).unwrap();

    assert_eq!(sdiffs.len(), 1);
    assert!(sdiffs.contains_key(&G01));
}

#[test]
fn epoch_by_epoch() {
    let ephemerides = timeline(&[G01, G02, G03, G04]).gap_filled();
    let first_good = ephemerides.first_good();

    let obs = |k: usize, lock: f64| {
        observation_table([G01, G02, G03, G04].iter().map(|sv| {
            (
                t(k),
                *sv,
                RawObservation::new(2.0E7, 100.0 * k as f64, 45.0, lock),
            )
        }))
    };

    let local = [obs(0, 1.0), obs(1, 1.0)];
    let remote = [obs(0, 3.0), obs(1, 3.0)];

    let pipeline = fixed_pipeline();
    let mut state = EpochState::default();

    for k in 0..2 {
        let aligned = crate::prelude::align(&local[k], &remote[k], &first_good).unwrap();
        let observations = aligned.get(&t(k)).unwrap();
        let eph = ephemerides.as_of(t(k)).unwrap();

        let (epoch, next) = pipeline.step(t(k), observations, eph, &state).unwrap();
        assert_eq!(epoch.sdiffs.len(), 4);

        // carried state only depends on this epoch
        assert_eq!(next.locks.len(), 4);
        assert_eq!(next.local.epoch(), Some(t(k)));
        assert_eq!(next.local.phase(&G01), Some(100.0 * k as f64));

        if k == 0 {
            assert!(epoch.local_ecef.iter().all(|v| v.is_nan()));
        } else {
            assert_eq!(epoch.local_ecef, fixed_position());
        }

        state = next;
    }
}

/// Consistent dataset: pseudo ranges generated from the
/// broadcast orbits and known receiver positions.
fn consistent_dataset(
    rx_local: Vector3<f64>,
    rx_remote: Vector3<f64>,
) -> (EphemerisTimeline, ObservationTable, ObservationTable) {
    let svs = [G01, G02, G03, G04, G05, G06];
    let kepler = Kepler::default();
    let (bias_local, bias_remote) = (1.0E-4, -2.0E-4);

    let mut local = Vec::new();
    let mut remote = Vec::new();

    for k in 0..3 {
        for (i, sv) in svs.iter().enumerate() {
            let eph = gps_ephemeris(*sv, t(0));
            let state = kepler.satellite_state(&eph, t(k)).unwrap();

            let clock = state.clock_error * SPEED_OF_LIGHT_M_S;
            let pr_local = (state.position - rx_local).norm() + bias_local * SPEED_OF_LIGHT_M_S - clock;
            let pr_remote =
                (state.position - rx_remote).norm() + bias_remote * SPEED_OF_LIGHT_M_S - clock;

            let phase = 1.0E8 + 1.0E3 * i as f64 + 50.0 * k as f64;

            local.push((t(k), *sv, RawObservation::new(pr_local, phase, 45.0, 1.0)));
            remote.push((t(k), *sv, RawObservation::new(pr_remote, phase, 42.0, 1.0)));
        }
    }

    (
        timeline(&svs),
        observation_table(local),
        observation_table(remote),
    )
}

#[test]
fn absolute_positions() {
    init_logger();

    let rx_local = Vector3::new(4_027_893.0, 307_045.0, 4_919_474.0);
    let rx_remote = Vector3::new(4_027_881.0, 307_046.0, 4_919_499.0);

    let (ephemerides, local, remote) = consistent_dataset(rx_local, rx_remote);

    let cfg = Config::default().with_solver_opts(SolverOpts {
        earth_rotation: false,
        ..Default::default()
    });

    let output = Pipeline::new(&cfg).run(ephemerides, &local, &remote).unwrap();

    assert_eq!(output.len(), 3);
    assert_eq!(output.sdiffs.get(&t(2)).unwrap().len(), 6);

    for k in 1..3 {
        let err = (output.local_ecef.get(&t(k)).unwrap() - rx_local).norm();
        assert!(err < 1.0E-2, "{} - local position error {}m", t(k), err);

        let err = (output.remote_ecef.get(&t(k)).unwrap() - rx_remote).norm();
        assert!(err < 1.0E-2, "{} - remote position error {}m", t(k), err);
    }
}

fn fingerprint(output: &Output) -> Vec<u64> {
    let mut bits = Vec::new();
    for (t, sdiffs) in output.sdiffs.iter() {
        bits.push(t.to_time_of_week().1);
        for (sv, record) in sdiffs.iter() {
            bits.push(sv.prn as u64);
            bits.push(record.pseudorange.to_bits());
            bits.push(record.phase.to_bits());
            bits.push(record.doppler.to_bits());
            bits.push(record.snr.to_bits());
            bits.extend(record.sv_position.iter().map(|v| v.to_bits()));
            bits.extend(record.sv_velocity.iter().map(|v| v.to_bits()));
        }
    }
    for positions in [&output.local_ecef, &output.remote_ecef] {
        for (_, ecef) in positions.iter() {
            bits.extend(ecef.iter().map(|v| v.to_bits()));
        }
    }
    bits
}

#[test]
fn deterministic_runs() {
    let rx = Vector3::new(4_027_893.0, 307_045.0, 4_919_474.0);
    let (ephemerides, local, remote) = consistent_dataset(rx, rx);

    let pipeline = Pipeline::new(&Config::default());

    let first = pipeline.run(ephemerides.clone(), &local, &remote).unwrap();
    let second = pipeline.run(ephemerides, &local, &remote).unwrap();

    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn late_ephemeris_is_back_seeded() {
    // G02 frame only published at t1: used for t0 as well
    let mut ephemerides = timeline(&[G01]);
    ephemerides.insert(t(1), gps_ephemeris(G02, t(1)));

    let obs = observation_table(
        [G01, G02]
            .iter()
            .map(|sv| (t(0), *sv, RawObservation::new(2.0E7, 1.0E3, 45.0, 1.0))),
    );

    let output = fixed_pipeline().run(ephemerides, &obs, &obs).unwrap();
    let sdiffs = output.sdiffs.get(&t(0)).unwrap();
    assert_eq!(sdiffs.len(), 2);
}

#[test]
fn disjoint_epoch_is_skipped() {
    init_logger();

    let svs = [G01, G02, G03, G04];
    let ephemerides = timeline(&svs);

    let common = |k: usize| {
        svs.iter()
            .map(move |sv| (t(k), *sv, RawObservation::new(2.0E7, 60.0 * k as f64, 45.0, 1.0)))
            .collect::<Vec<_>>()
    };

    // t1: no satellite in common, local counters and phases are off
    let mut local = common(0);
    local.push((t(1), G01, RawObservation::new(2.0E7, 1.0E6, 45.0, 7.0)));
    local.extend(common(2));

    let mut remote = common(0);
    remote.push((t(1), G02, RawObservation::new(2.0E7, 1.0E6, 45.0, 7.0)));
    remote.extend(common(2));

    let solver = FixedSolver::new(fixed_position());
    let history = solver.history.clone();

    let pipeline =
        Pipeline::with_capabilities(&Config::default(), StaticStates::default(), solver);

    let output = pipeline
        .run(ephemerides, &observation_table(local), &observation_table(remote))
        .unwrap();

    assert_eq!(output.len(), 2);
    assert!(output.sdiffs.get(&t(1)).is_none(), "disjoint epoch should be dropped");
    assert!(output.local_ecef.get(&t(1)).is_none());

    // lock continuity is assessed against t0
    let at_t2 = output.sdiffs.get(&t(2)).unwrap();
    assert_eq!(at_t2.len(), 4);

    assert_eq!(output.local_ecef.get(&t(2)), Some(&fixed_position()));
    assert_eq!(output.remote_ecef.get(&t(2)), Some(&fixed_position()));

    // phase rate over t0 -> t2: 120 cycles / 60 s
    let history = history.borrow();
    assert_eq!(history.len(), 8);
    for m in history.iter() {
        assert_eq!(m.doppler, 2.0, "{} ({}) - invalid doppler", t(2), m.sv);
    }
}
