//! Human-readable snapshot summary for `civic-daemon inspect`.

use std::fmt::Write;

use civic_node::{BootstrapState, LedgerSnapshot};
use civic_utils::format_duration;
use civic_verification::ClaimStatus;

pub fn summarize(snapshot: &LedgerSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, snapshot);
    out
}

fn write_summary(out: &mut String, s: &LedgerSnapshot) -> std::fmt::Result {
    writeln!(out, "snapshot version {}", s.version)?;

    let boot = &s.bootstrap;
    match boot.state() {
        BootstrapState::Pending => writeln!(out, "bootstrap: pending (deployer {})", boot.deployer())?,
        BootstrapState::Done => writeln!(
            out,
            "bootstrap: done at {} (control held by {})",
            boot.completed_at().map(|t| t.to_string()).unwrap_or_default(),
            boot.consensus_account()
        )?,
    }

    let v = &s.voting;
    let approved = v
        .votes
        .values()
        .filter(|voters| voters.len() as u64 >= u64::from(v.threshold))
        .count();
    writeln!(out, "consensus:")?;
    writeln!(out, "  threshold        {}", v.threshold)?;
    writeln!(out, "  agents           {}", v.agents.len())?;
    writeln!(out, "  claims voted     {} ({approved} approved)", v.votes.len())?;
    writeln!(out, "  open requests    {}", v.requests.len())?;

    let w = &s.workflow;
    let verified = w
        .records
        .values()
        .filter(|r| r.status == ClaimStatus::Verified)
        .count();
    writeln!(out, "verification:")?;
    writeln!(out, "  operators        {}", w.operators.len())?;
    writeln!(out, "  records          {} ({verified} verified)", w.records.len())?;
    writeln!(
        out,
        "  submit interval  {}",
        format_duration(w.submission_interval_secs)
    )?;

    let g = &s.gateway;
    writeln!(out, "gateway:")?;
    writeln!(out, "  cooldown         {}", format_duration(g.cooldown_secs))?;
    writeln!(out, "  daily cap        {}", g.daily_cap)?;
    writeln!(out, "  processed        {}", g.processed.action_count())?;
    writeln!(out, "  claims consumed  {}", g.processed.consumed_count())?;
    writeln!(out, "  actors tracked   {}", g.rate_limits.len())?;
    Ok(())
}
