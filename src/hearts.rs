use rand::Rng;

const HEART_COUNT: usize = 35;
const MARGIN: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Heart {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub vy: f32,
    pub vx: f32,
    pub alpha: f32,
    pub hue: f32,
}

/// Hearts drifting down the header. Purely decorative.
#[derive(Debug, Clone, Default)]
pub struct HeartField {
    width: f32,
    height: f32,
    hearts: Vec<Heart>,
}

impl HeartField {
    #[cfg(test)]
    pub fn hearts(&self) -> &[Heart] {
        &self.hearts
    }

    /// Re-seeds the field when the drawing area changes size.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (f32::from(width), f32::from(height));
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        let mut rng = rand::thread_rng();
        self.hearts = (0..HEART_COUNT)
            .map(|_| Heart {
                x: rng.gen::<f32>() * width,
                y: rng.gen::<f32>() * height,
                size: 6.0 + rng.gen::<f32>() * 10.0,
                vy: 0.03 + rng.gen::<f32>() * 0.08,
                vx: -0.05 + rng.gen::<f32>() * 0.1,
                alpha: 0.4 + rng.gen::<f32>() * 0.6,
                hue: 310.0 + rng.gen::<f32>() * 40.0,
            })
            .collect();
    }

    pub fn tick(&mut self) {
        let (w, h) = (self.width, self.height);
        for heart in &mut self.hearts {
            heart.y += heart.vy;
            heart.x += heart.vx + (heart.y * 0.5).sin() * 0.03;
            if heart.y > h + MARGIN {
                heart.y = -MARGIN;
            }
            if heart.x < -MARGIN {
                heart.x = w + MARGIN;
            }
            if heart.x > w + MARGIN {
                heart.x = -MARGIN;
            }
        }
    }

    /// Hearts that currently sit inside the area, as cell coordinates.
    pub fn visible(&self) -> impl Iterator<Item = (u16, u16, &Heart)> + '_ {
        self.hearts.iter().filter_map(move |heart| {
            if heart.x < 0.0 || heart.y < 0.0 || heart.x >= self.width || heart.y >= self.height {
                return None;
            }
            Some((heart.x as u16, heart.y as u16, heart))
        })
    }
}

impl Heart {
    pub fn glyph(&self) -> char {
        if self.size > 11.0 {
            '♥'
        } else {
            '♡'
        }
    }

    /// Colour from the heart's hue at 80% saturation and 70% lightness, faded by alpha.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let (s, l) = (0.8_f32, 0.7_f32);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = (self.hue % 360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let scale = |v: f32| ((v + m) * self.alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        (scale(r), scale(g), scale(b))
    }
}
