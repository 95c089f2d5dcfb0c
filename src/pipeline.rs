pub mod sink;
pub mod wireframe;
