//! Text output formatter

use specdown_core::{DeltaPlan, Requirement, Severity};

use super::FileReport;

pub fn output_reports(reports: &[FileReport]) {
    for report in reports {
        if report.issues.is_empty() {
            continue;
        }

        println!("\n{}:", report.path.display());
        for issue in &report.issues {
            let severity = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!(
                "  {}:{} {}: {}",
                issue.location.start.line,
                issue.location.start.column + 1,
                severity,
                issue.message
            );
        }
    }

    let errors: usize = reports.iter().map(|r| r.count(Severity::Error)).sum();
    let warnings: usize = reports.iter().map(|r| r.count(Severity::Warning)).sum();

    println!();
    println!(
        "Validated {} files, found {} errors and {} warnings",
        reports.len(),
        errors,
        warnings
    );
}

pub fn output_requirements(requirements: &[Requirement]) {
    for requirement in requirements {
        println!(
            "{} ({} scenarios)",
            requirement.name,
            requirement.scenarios.len()
        );
        for scenario in &requirement.scenarios {
            println!("  - {}", scenario);
        }
    }
}

pub fn output_delta(plan: &DeltaPlan) {
    for requirement in &plan.added {
        println!("ADDED     {}", requirement.name);
    }
    for requirement in &plan.modified {
        println!("MODIFIED  {}", requirement.name);
    }
    for name in &plan.removed {
        println!("REMOVED   {}", name);
    }
    for rename in &plan.renamed {
        println!("RENAMED   {} -> {}", rename.from, rename.to);
    }
    println!();
    println!("{} operations", plan.len());
}
