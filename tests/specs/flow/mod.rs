mod common;
mod properties;
mod s1_happy_path;
mod s2_pause_for_input;
mod s3_resume_gate_fingerprint;
mod s4_worker_crash_recovery;
mod s5_supervisor_restart;
mod s6_sandbox_normalization;
