use rand::Rng;

/// Random body color: any hue, 50-100% saturation, 50% lightness.
pub fn random_body_color(rng: &mut impl Rng) -> u32 {
    let hue = rng.gen_range(0..360) as f64;
    let saturation = (rng.gen_range(0..50) + 50) as f64 / 100.0;
    hsl_to_rgb(hue, saturation, 0.5)
}

/// HSL (h in degrees, s and l in 0..=1) to 0xRRGGBB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> u32 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let ri = ((r + m) * 255.0).round() as u32;
    let gi = ((g + m) * 255.0).round() as u32;
    let bi = ((b + m) * 255.0).round() as u32;

    (ri << 16) | (gi << 8) | bi
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), 0xff0000);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), 0x00ff00);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), 0x0000ff);
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert_eq!(hsl_to_rgb(200.0, 0.0, 0.5), 0x808080);
    }

    #[test]
    fn random_colors_are_valid_rgb() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let color = random_body_color(&mut rng);
            assert!(color <= 0xFFFFFF, "Color {:#x} out of range", color);
        }
    }

    #[test]
    fn same_seed_same_colors() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(random_body_color(&mut a), random_body_color(&mut b));
        }
    }
}
