//! Cross-run merge integration tests.
//!
//! A run of a class is captured into an `AnalysisSession`, a second run is then analyzed
//! against it. Methods are matched by merge key and instruction signature.

use covscope::{
    analysis::{
        instruction_signature, merge_method, AccessFlags, AnalysisConfig, AnalysisSession,
        ClassDescriptor, ClassInput, InsnHandle, InstructionsBuilder, Label, MergeOutcome,
        MethodBody, MethodDescriptor, MethodEvent,
    },
    coverage::Counter,
    Error, Result,
};

fn signed(handle: u32, opcode: &str, operands: &[u32]) -> MethodEvent {
    MethodEvent::Instruction {
        handle: InsnHandle(handle),
        signature: Some(instruction_signature(handle as usize, opcode, operands)),
    }
}

/// Three returns selected by a switch, probes `base..base + 3`.
fn switch(base: usize) -> Vec<MethodEvent> {
    let mut events = vec![
        MethodEvent::LineNumber(20),
        signed(0, "TABLESWITCH", &[1, 2]),
        MethodEvent::Jump { target: Label(1), branch: 1 },
        MethodEvent::Jump { target: Label(2), branch: 2 },
    ];
    for case in 0..3u32 {
        if case > 0 {
            events.push(MethodEvent::NoSuccessor);
            events.push(MethodEvent::Label { label: Label(case), successor: false });
        }
        events.push(MethodEvent::LineNumber(21 + case));
        events.push(signed(case + 1, "IRETURN", &[]));
        events.push(MethodEvent::Probe { probe: base + case as usize, branch: 0 });
    }
    events.push(MethodEvent::EndMethod);
    events
}

fn class_input(methods: Vec<(&str, Vec<MethodEvent>)>, probes: Vec<bool>) -> ClassInput {
    let methods = methods
        .into_iter()
        .map(|(name, events)| {
            MethodBody::new(MethodDescriptor::new(AccessFlags::PUBLIC, name, "(I)I"), events)
        })
        .collect();
    ClassInput::new(ClassDescriptor::new("com/example/Switch"), methods, Some(probes))
}

#[test]
fn probes_and_coverage_are_or_combined() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(vec![("pick", switch(0))], vec![true, false, false]))?;

    let analysis =
        session.analyze_class(&class_input(vec![("pick", switch(0))], vec![false, false, true]))?;
    assert_eq!(analysis.probes, Some(vec![true, false, true]));

    let method = &analysis.coverage.methods()[0];
    assert_eq!(method.instruction_counter(), Counter::new(1, 3));
    assert_eq!(method.branch_counter(), Counter::new(1, 2));
    assert!(method.lines().get(22).unwrap().instructions().missed() == 1);
    Ok(())
}

#[test]
fn merging_twice_changes_nothing() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(vec![("pick", switch(0))], vec![true, false, false]))?;

    let first =
        session.analyze_class(&class_input(vec![("pick", switch(0))], vec![false, false, true]))?;
    let merged_probes = first.probes.clone().unwrap_or_default();
    let second = session.analyze_class(&class_input(vec![("pick", switch(0))], merged_probes))?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn merged_result_absorbs_either_input() -> Result<()> {
    let previous = vec![true, false, false];
    let current = vec![false, false, true];

    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(vec![("pick", switch(0))], previous.clone()))?;
    let merged = session.analyze_class(&class_input(vec![("pick", switch(0))], current.clone()))?;
    let merged_probes = merged.probes.clone().unwrap_or_default();

    // the merged run taken as the previous one, merged again with each original input
    for input in [current, previous] {
        let session = AnalysisSession::new(AnalysisConfig::default());
        session.capture_class(&class_input(vec![("pick", switch(0))], merged_probes.clone()))?;
        let again = session.analyze_class(&class_input(vec![("pick", switch(0))], input))?;

        assert_eq!(again.probes, merged.probes);
        assert_eq!(again.coverage, merged.coverage);
    }
    Ok(())
}

#[test]
fn merged_graph_is_stable_against_current_run() -> Result<()> {
    let previous = InstructionsBuilder::build(Some(&[true, false, false]), &switch(0))?
        .signature_map()
        .unwrap();
    let mut graph = InstructionsBuilder::build(Some(&[false, false, true]), &switch(0))?;
    let current = graph.signature_map().unwrap();

    merge_method("com/example/Switch", "pick", &mut graph, Some(&previous), None, None)?;
    let merged = graph.signature_map().unwrap();

    let outcome = merge_method("com/example/Switch", "pick", &mut graph, Some(&current), None, None)?;
    assert!(outcome.is_merged());
    assert_eq!(graph.signature_map().unwrap(), merged);
    assert_eq!(graph.covered_count(), 3);
    Ok(())
}

#[test]
fn changed_method_is_not_merged() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(vec![("pick", switch(0))], vec![true, true, true]))?;

    let mut changed = switch(0);
    // one more instruction in front of the switch
    changed.insert(1, signed(9, "ILOAD", &[1]));
    let analysis = session.analyze_class(&class_input(vec![("pick", changed)], vec![false, false, false]))?;

    assert_eq!(analysis.probes, Some(vec![false, false, false]));
    assert_eq!(analysis.coverage.instruction_counter(), Counter::new(5, 0));
    Ok(())
}

#[test]
fn methods_are_matched_by_key() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(
        vec![("a", switch(0)), ("b", switch(3))],
        vec![true, false, false, false, false, false],
    ))?;

    let analysis = session.analyze_class(&class_input(
        vec![("a", switch(0)), ("b", switch(3))],
        vec![false, false, false, false, true, false],
    ))?;
    assert_eq!(
        analysis.probes,
        Some(vec![true, false, false, false, true, false])
    );

    let methods = analysis.coverage.methods();
    assert_eq!(methods[0].name(), "a");
    assert_eq!(methods[0].instruction_counter(), Counter::new(2, 2));
    assert_eq!(methods[1].instruction_counter(), Counter::new(2, 2));
    Ok(())
}

#[test]
fn reset_forgets_previous_runs() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());
    session.capture_class(&class_input(vec![("pick", switch(0))], vec![true, false, false]))?;
    assert!(session.has_snapshot("com/example/Switch"));
    session.reset();

    let analysis =
        session.analyze_class(&class_input(vec![("pick", switch(0))], vec![false, false, true]))?;
    assert_eq!(analysis.probes, Some(vec![false, false, true]));
    Ok(())
}

#[test]
fn node_count_mismatch_leaves_graph_untouched() -> Result<()> {
    let previous_graph = InstructionsBuilder::build(Some(&[true, true, true]), &switch(0))?;
    let previous = previous_graph.signature_map().unwrap();

    let mut shorter = vec![signed(0, "ICONST_0", &[]), MethodEvent::Probe { probe: 0, branch: 0 }];
    shorter.push(MethodEvent::EndMethod);
    let mut graph = InstructionsBuilder::build(Some(&[false]), &shorter)?;

    let mut probes = vec![false];
    let outcome = merge_method(
        "com/example/Switch",
        "pick",
        &mut graph,
        Some(&previous),
        Some(probes.as_mut_slice()),
        None,
    )?;
    assert_eq!(
        outcome,
        MergeOutcome::NodeCountMismatch {
            current: 1,
            previous: 4
        }
    );
    assert_eq!(graph.covered_count(), 0);
    assert_eq!(probes, [false]);
    Ok(())
}

#[test]
fn inconsistent_probe_span_is_an_error() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default());

    // identical instructions, but the previous run probed only two of the returns
    let mut previous = switch(0);
    previous.retain(|event| !matches!(event, MethodEvent::Probe { probe: 2, .. }));
    session.capture_class(&class_input(vec![("pick", previous)], vec![true, true]))?;

    let err = session
        .analyze_class(&class_input(vec![("pick", switch(0))], vec![false, false, false]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ProbeSpanMismatch {
            current: 3,
            previous: 2,
            ..
        }
    ));
    Ok(())
}

#[test]
fn parallel_batch_merges_each_class() -> Result<()> {
    let session = AnalysisSession::new(AnalysisConfig::default().with_threads(4));
    let input = |name: String, probes: Vec<bool>| {
        let method = MethodBody::new(MethodDescriptor::new(AccessFlags::PUBLIC, "pick", "(I)I"), switch(0));
        ClassInput::new(ClassDescriptor::new(name), vec![method], Some(probes))
    };

    let previous: Vec<_> = (0..16)
        .map(|i| input(format!("C{i}"), vec![true, false, false]))
        .collect();
    session.capture_classes(&previous)?;
    assert_eq!(session.snapshot_count(), 16);

    let current: Vec<_> = (0..16)
        .map(|i| input(format!("C{i}"), vec![false, i % 2 == 0, false]))
        .collect();
    let results = session.analyze_classes(&current)?;
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.coverage.name(), format!("C{i}"));
        assert_eq!(result.probes, Some(vec![true, i % 2 == 0, false]));
    }
    Ok(())
}
