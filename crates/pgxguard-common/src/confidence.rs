//! Evidence-based confidence scoring for risk assessments.
//!
//! Confidence is a pure function of the gene call's evidence: how many variants were
//! detected, how cleanly the activity score classifies, variant impact, and
//! sequencing-quality signals. Bounded to [0.40, 0.99].

use crate::profile::GeneCall;

pub const CONFIDENCE_FLOOR: f64 = 0.40;
pub const CONFIDENCE_CEILING: f64 = 0.99;

/// Impact keywords that mark a variant as well-characterized loss of function.
const HIGH_IMPACT_KEYWORDS: [&str; 4] = ["nonfunctional", "frameshift", "stop", "splice"];

/// Compute assessment confidence from a gene call's evidence.
/// Returns a value in [0.40, 0.99], rounded to 2 decimals.
pub fn compute_confidence(call: &GeneCall) -> f64 {
    let n = call.detected_variants.len();
    let base = base_from_variant_count(n);
    // With zero variants the activity score is an assumed default, not evidence,
    // so it carries no adjustment.
    let activity = if n > 0 {
        activity_adjustment(call.activity_score)
    } else {
        0.0
    };
    let impact = high_impact_bonus(call);
    let penalty = quality_penalty(call, n);

    let score = (base + activity + impact - penalty).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);
    (score * 100.0).round() / 100.0
}

/// Base confidence from the number of detected variants.
/// Zero variants means wild-type was assumed, which is moderately but not fully certain.
fn base_from_variant_count(n: usize) -> f64 {
    match n {
        0 => 0.55,
        1 => 0.67,
        2 => 0.76,
        3 => 0.84,
        4 => 0.89,
        _ => (0.89 + 0.012 * (n as f64 - 4.0)).min(0.94),
    }
}

/// Activity scores at the extremes classify unambiguously; mid-range scores sit on
/// phenotype boundaries and are harder to call.
fn activity_adjustment(activity: f64) -> f64 {
    if activity == 0.0 {
        0.06 // complete loss of function
    } else if activity <= 0.25 {
        0.04
    } else if activity >= 2.5 {
        0.04 // clear ultra-rapid
    } else if activity >= 2.0 {
        0.03 // well-characterized normal
    } else if activity > 0.75 && activity < 1.25 {
        -0.05 // intermediate band
    } else if activity <= 0.5 {
        0.02
    } else {
        0.0
    }
}

fn high_impact_bonus(call: &GeneCall) -> f64 {
    let count = call
        .detected_variants
        .iter()
        .filter(|v| {
            let impact = v.impact.to_lowercase();
            HIGH_IMPACT_KEYWORDS.iter().any(|kw| impact.contains(kw))
        })
        .count();
    (count as f64 * 0.025).min(0.05)
}

fn quality_penalty(call: &GeneCall, variant_count: usize) -> f64 {
    let mut penalty = 0.0;

    if let Some(gq) = call.min_gq {
        if gq < 10.0 {
            penalty += 0.10;
        } else if gq < 20.0 {
            penalty += 0.05;
        }
    }

    if let Some(dp) = call.min_dp {
        if dp < 5.0 {
            penalty += 0.10;
        } else if dp < 10.0 {
            penalty += 0.05;
        }
    }

    // Unphased heterozygous calls only matter when multiple variants could be in cis.
    if call.has_unphased_het && variant_count > 1 {
        penalty += 0.08;
    }

    let conflicting = call
        .quality_flags
        .iter()
        .any(|f| f.to_lowercase().contains("conflicting functional"));
    if conflicting {
        penalty += 0.10;
    }

    penalty
}
