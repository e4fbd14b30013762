pub mod line;
pub mod surface;

pub use line::Line;
pub use surface::{Cone, Cylinder, Plane, Primitive, Sphere, Surface};
