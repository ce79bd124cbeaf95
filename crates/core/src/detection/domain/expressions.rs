//! Facial expression probabilities as reported by the expression classifier.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    Neutral,
    Happy,
    Surprised,
    Sad,
    Angry,
    Disgusted,
    Fearful,
    Contemptuous,
}

impl Expression {
    pub const COUNT: usize = 8;

    /// Classifier output order.
    pub const ALL: [Expression; Expression::COUNT] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Surprised,
        Expression::Sad,
        Expression::Angry,
        Expression::Disgusted,
        Expression::Fearful,
        Expression::Contemptuous,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Surprised => "surprised",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Disgusted => "disgusted",
            Expression::Fearful => "fearful",
            Expression::Contemptuous => "contemptuous",
        };
        f.write_str(name)
    }
}

/// One probability per [`Expression`], indexed in [`Expression::ALL`] order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expressions {
    probabilities: [f64; Expression::COUNT],
}

impl Expressions {
    pub fn new(probabilities: [f64; Expression::COUNT]) -> Self {
        Self { probabilities }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Expression, f64)>) -> Self {
        let mut probabilities = [0.0; Expression::COUNT];
        for (expr, p) in pairs {
            probabilities[expr.index()] = p;
        }
        Self { probabilities }
    }

    pub fn probability(&self, expression: Expression) -> f64 {
        self.probabilities[expression.index()]
    }

    pub fn happy(&self) -> f64 {
        self.probability(Expression::Happy)
    }

    /// Strictly above `threshold`; the boundary itself does not count.
    pub fn is_smiling(&self, threshold: f64) -> bool {
        self.happy() > threshold
    }

    /// Highest-probability expression; first in classifier order on ties.
    pub fn dominant(&self) -> Option<(Expression, f64)> {
        self.ranked(0.0).into_iter().next()
    }

    /// Expressions at or above `min_probability`, most likely first.
    pub fn ranked(&self, min_probability: f64) -> Vec<(Expression, f64)> {
        let mut ranked: Vec<(Expression, f64)> = Expression::ALL
            .iter()
            .map(|&e| (e, self.probability(e)))
            .filter(|&(_, p)| p >= min_probability && p > 0.0)
            .collect();
        // Stable sort keeps classifier order among equal probabilities
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}
