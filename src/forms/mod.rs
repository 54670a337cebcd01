pub mod terminations;
