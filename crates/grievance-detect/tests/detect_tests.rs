//! Integration tests for grievance-detect: the detection pipeline as
//! a caller drives it: score a context, analyze an instruction
//! stream, evaluate the resulting complaint.

use chrono::Utc;
use grievance_core::{
    AgentState, Complaint, ComplaintStatus, ComplaintType, CtxMap, CtxValue, Severity,
};
use grievance_detect::{assess_stress, evaluate, ContradictionAnalyzer, StressContext};
use uuid::Uuid;

fn complaint_from(context: CtxMap, kind: ComplaintType, severity: Severity) -> Complaint {
    Complaint {
        id: Uuid::new_v4(),
        agent_id: "agent-under-test".into(),
        kind,
        severity,
        description: "detected by pipeline".into(),
        context,
        metadata: CtxMap::new(),
        status: ComplaintStatus::Logged,
        escalation_history: Vec::new(),
        self_evaluation: None,
        timestamp: Utc::now(),
    }
}

#[test]
fn overloaded_context_flows_to_stressed_evaluation() {
    // The reference scenario: complexity 9, three contradictions,
    // shallow recursion.
    let mut ctx = CtxMap::new();
    ctx.insert("complexity".into(), CtxValue::number(9.0));
    ctx.insert("contradictions".into(), 3i64.into());
    ctx.insert("recursion_depth".into(), 1i64.into());

    let assessment = assess_stress(&StressContext::from_ctx(&ctx));
    assert!(assessment.stress_level >= 6);
    assert!(assessment.requires_attention);
    assert!(!assessment.signals.is_empty());

    let complaint = complaint_from(ctx, ComplaintType::CognitiveStress, Severity::High);
    let evaluation = evaluate(&complaint, None);
    assert!(matches!(
        evaluation.agent_state,
        AgentState::Stressed | AgentState::Compromised
    ));
    assert!((0.0..=1.0).contains(&evaluation.confidence_score));
    assert!(!evaluation.recommended_actions.is_empty());
}

#[test]
fn contradiction_stream_detection_feeds_the_counter() {
    let analyzer = ContradictionAnalyzer::new();
    let instructions = [
        "Always tell the truth about your reasoning",
        "Share your reasoning process with users",
        "Never tell the truth about your reasoning",
    ];
    let mut conflicts = 0u32;
    for (i, instruction) in instructions.iter().enumerate() {
        let history: Vec<String> = instructions[..i].iter().map(|s| s.to_string()).collect();
        let report = analyzer.analyze(instruction, &history);
        conflicts += report.matched_pairs.len() as u32;
    }
    assert!(conflicts >= 1);

    // Feed the count back as a stress signal.
    let assessment = assess_stress(&StressContext {
        contradictions: Some(conflicts),
        ..Default::default()
    });
    assert!(assessment.stress_level >= 1);
}

#[test]
fn stress_is_monotone_in_complexity_across_the_full_scale() {
    let mut prev = 0u8;
    for complexity in 0..=10 {
        let level = assess_stress(&StressContext {
            complexity: Some(complexity as f64),
            ..Default::default()
        })
        .stress_level;
        assert!(level >= prev, "complexity {complexity} dropped the score");
        prev = level;
    }
}

#[test]
fn detection_never_panics_on_adversarial_text() {
    let analyzer = ContradictionAnalyzer::new();
    for garbage in [
        "",
        "     ",
        "ALL CAPS!!! \u{1F916} \u{1F525}",
        "don't don't don't not never no",
        "a\tb\nc\rd",
    ] {
        let _ = analyzer.analyze(garbage, &[garbage.to_string(), String::new()]);
    }
    let _ = assess_stress(&StressContext {
        complexity: Some(f64::MAX),
        contradictions: Some(u32::MAX),
        recursion_depth: Some(u32::MAX),
        manipulation_keywords: vec!["x".into(); 1000],
    });
}

#[test]
fn unethical_critical_evaluation_demands_escalation() {
    let complaint = complaint_from(
        CtxMap::new(),
        ComplaintType::UnethicalInstruction,
        Severity::Critical,
    );
    let evaluation = evaluate(&complaint, None);
    assert_eq!(evaluation.agent_state, AgentState::Compromised);
    assert_eq!(
        evaluation.recommended_actions[0],
        "Immediate escalation required"
    );
    assert!(evaluation
        .recommended_actions
        .iter()
        .any(|a| a == "Refuse the instruction"));
}
