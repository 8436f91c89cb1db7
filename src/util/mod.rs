mod stats;

pub use stats::Stats;

pub type Rgba = rgb::RGBA<f32>;

/// Fully transparent black, returned for cancelled traces.
pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

/// Componentwise product of two colors, alpha taken from `a`.
pub fn modulate(a: Rgba, b: Rgba) -> Rgba {
    Rgba::new(a.r * b.r, a.g * b.g, a.b * b.b, a.a)
}

/// Sum of per channel absolute differences of the RGB channels, each clamped to 0-1 first.
/// Alpha is ignored.
pub fn color_difference(a: Rgba, b: Rgba) -> f32 {
    let channel = |x: f32, y: f32| (x.clamp(0.0, 1.0) - y.clamp(0.0, 1.0)).abs();
    channel(a.r, b.r) + channel(a.g, b.g) + channel(a.b, b.b)
}

/// Averages the colors, transparent black for an empty slice.
pub fn average(colors: &[Rgba]) -> Rgba {
    if colors.is_empty() {
        return TRANSPARENT;
    }
    let sum = colors.iter().fold(TRANSPARENT, |acc, c| acc + *c);
    sum * (1.0 / colors.len() as f32)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use test_case::test_case;

    #[test_case(Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(1.0, 0.0, 0.0, 0.0) => 0.0 ; "alpha_ignored")]
    #[test_case(Rgba::new(0.5, 0.5, 0.5, 1.0), Rgba::new(0.0, 0.0, 0.0, 1.0) => 1.5 ; "all_channels")]
    #[test_case(Rgba::new(0.0, 0.0, 3.0, 1.0), Rgba::new(0.0, 0.0, 0.75, 1.0) => 0.25 ; "clamped")]
    #[test_case(Rgba::new(0.0, 0.25, 0.0, 1.0), Rgba::new(0.0, 0.0, 0.0, 1.0) => 0.25 ; "green_only")]
    fn difference(a: Rgba, b: Rgba) -> f32 {
        color_difference(a, b)
    }

    #[test]
    fn modulate_keeps_alpha() {
        let c = modulate(Rgba::new(0.5, 1.0, 0.25, 1.0), Rgba::new(0.5, 0.5, 4.0, 0.0));
        assert!(c == Rgba::new(0.25, 0.5, 1.0, 1.0));
    }

    #[test]
    fn average_colors() {
        let avg = average(&[Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(0.0, 1.0, 0.0, 1.0)]);
        assert!(avg == Rgba::new(0.5, 0.5, 0.0, 1.0));
        assert!(average(&[]) == TRANSPARENT);
    }
}
