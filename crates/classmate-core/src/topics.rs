//! Static calculus topic taxonomy: chapter -> subtopics.

pub const CALCULUS_TOPICS: &[(&str, &[&str])] = &[
    (
        "Chapter 1: Functions and Graphs",
        &[
            "Review of Functions",
            "Basic Classes of Functions",
            "Trigonometric Functions",
            "Inverse Functions",
            "Exponential and Logarithmic Functions",
        ],
    ),
    (
        "Chapter 2: Limits",
        &[
            "A Preview of Calculus",
            "The Limit of a Function",
            "The Limit Laws",
            "Continuity",
            "The Precise Definition of a Limit",
        ],
    ),
    (
        "Chapter 3: Derivatives",
        &[
            "Defining the Derivative",
            "The Derivative as a Function",
            "Differentiation Rules",
            "Derivatives as Rates of Change",
            "Derivatives of Trigonometric Functions",
            "The Chain Rule",
            "Derivatives of Inverse Functions",
            "Implicit Differentiation",
            "Derivatives of Exponential and Logarithmic Functions",
        ],
    ),
    (
        "Chapter 4: Applications of Derivatives",
        &[
            "Related Rates",
            "Linear Approximations and Differentials",
            "Maxima and Minima",
            "The Mean Value Theorem",
            "Derivatives and the Shape of a Graph",
            "Limits at Infinity and Asymptotes",
            "Applied Optimization Problems",
            "L’Hôpital’s Rule",
            "Newton’s Method",
            "Antiderivatives",
        ],
    ),
    (
        "Chapter 5: Integration",
        &[
            "Approximating Areas",
            "The Definite Integral",
            "The Fundamental Theorem of Calculus",
            "Integration Formulas and the Net Change Theorem",
            "Substitution",
            "Integrals Involving Exponential and Logarithmic Functions",
            "Integrals Resulting in Inverse Trigonometric Functions",
        ],
    ),
    (
        "Chapter 6: Applications of Integration",
        &[
            "Areas between Curves",
            "Determining Volumes by Slicing",
            "Volumes of Revolution: Cylindrical Shells",
            "Arc Length of a Curve and Surface Area",
            "Physical Applications",
            "Moments and Centers of Mass",
            "Integrals, Exponential Functions, and Logarithms",
            "Exponential Growth and Decay",
            "Calculus of the Hyperbolic Functions",
        ],
    ),
];

/// Chapter titles in teaching order.
pub fn chapters() -> impl Iterator<Item = &'static str> {
    CALCULUS_TOPICS.iter().map(|(chapter, _)| *chapter)
}

/// Subtopics of `chapter`, or `None` for an unknown chapter.
pub fn subtopics(chapter: &str) -> Option<&'static [&'static str]> {
    CALCULUS_TOPICS
        .iter()
        .find(|(c, _)| *c == chapter)
        .map(|(_, subs)| *subs)
}

/// The chapter a subtopic belongs to.
pub fn chapter_of(subtopic: &str) -> Option<&'static str> {
    CALCULUS_TOPICS
        .iter()
        .find(|(_, subs)| subs.iter().any(|s| *s == subtopic))
        .map(|(chapter, _)| *chapter)
}
