use super::engine_metrics::EngineMetrics;

pub fn render_prometheus(m: &EngineMetrics) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "vigil_evaluations_total", m.evaluations_val());
    write_counter(&mut out, "vigil_evaluation_errors_total", m.evaluation_errors_val());
    write_counter(&mut out, "vigil_alerts_triggered_total", m.alerts_triggered_val());
    write_counter(&mut out, "vigil_alerts_suppressed_total", m.alerts_suppressed_val());
    write_counter(&mut out, "vigil_alerts_escalated_total", m.alerts_escalated_val());
    write_counter(&mut out, "vigil_alerts_resolved_total", m.alerts_resolved_val());
    write_counter(&mut out, "vigil_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "vigil_notifications_failed_total", m.notifications_failed_val());

    let (sum, count) = m.dispatch_latency_vals();
    write_summary(&mut out, "vigil_dispatch_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}
