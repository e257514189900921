use rand::Rng;

/// A 2D vector used for position, velocity and steering forces
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Rescales the vector to `length`. A zero vector stays zero.
    pub fn with_magnitude(self, length: f64) -> Self {
        let len = self.length();
        if len == 0.0 {
            return self;
        }
        Self {
            x: self.x * length / len,
            y: self.y * length / len,
        }
    }

    /// Scales the vector down to `max` if it is longer. Never scales up.
    pub fn limit(self, max: f64) -> Self {
        if self.length() > max {
            self.with_magnitude(max)
        } else {
            self
        }
    }

    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        Self {
            x: self.x / len,
            y: self.y / len,
        }
    }

    /// Replaces an exact zero vector with a tiny random one so that it has a
    /// direction. Each component gets a magnitude in `[1e-4, 1e-3)` with a
    /// random sign; any other vector is returned untouched.
    pub fn ensure_non_zero<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        if self.x != 0.0 || self.y != 0.0 {
            return self;
        }
        Self {
            x: jitter(rng),
            y: jitter(rng),
        }
    }

    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: &Vector2D) -> f64 {
        (*self - *other).length()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let magnitude = rng.gen_range(1e-4..1e-3);
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f64> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f64> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl core::ops::MulAssign<f64> for Vector2D {
    fn mul_assign(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

impl core::ops::DivAssign<f64> for Vector2D {
    fn div_assign(&mut self, scalar: f64) {
        self.x /= scalar;
        self.y /= scalar;
    }
}
