#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Point2 {
        Point2 { x, y }
    }
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Point3 {
        Point3 { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;

        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn scaled(&self, mag: f32) -> Point3 {
        Point3::new(self.x * mag, self.y * mag, self.z * mag)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Video pixel space is y-down, scene space is y-up.
    pub fn flip_y(&self, height: f32) -> Point3 {
        Point3::new(self.x, height - self.y, self.z)
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(p: [f32; 3]) -> Point3 {
        Point3::new(p[0], p[1], p[2])
    }
}

impl From<[f32; 2]> for Point2 {
    fn from(p: [f32; 2]) -> Point2 {
        Point2::new(p[0], p[1])
    }
}
