mod end_to_end;
mod interruption;
mod snapshot_consistency;
