pub mod sage_x3;
