pub mod recruitment;
