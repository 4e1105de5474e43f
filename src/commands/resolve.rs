use anyhow::{Context, Result};

use slotwatch::config::Config;
use slotwatch::resolver::{Candidate, HttpResolver, Resolver};

/// Arguments of the `resolve` command
#[derive(Debug, Clone, Default)]
pub struct ResolveParams {
    pub exam: Option<String>,
    pub location: Option<String>,
    pub list: bool,
}

/// Resolve or list exam and location ids
///
/// Only `EXAM_TYPE_ID` is needed; the exam id comes from `--exam`, then
/// `EXAM_NAME`, then `EXAM_ID`.
pub async fn resolve(config: Config, params: ResolveParams) -> Result<()> {
    let exam_type_id = config.exam.exam_type_id.trim().to_string();
    if exam_type_id.is_empty() {
        anyhow::bail!("EXAM_TYPE_ID is required to resolve exams and locations");
    }

    let resolver = HttpResolver::new(config.request_timeout())?;

    let exam_name = params.exam.or(config.exam.exam_name.clone());
    let exam_id = match exam_name {
        Some(name) => {
            let id = resolver
                .resolve_exam_id(&exam_type_id, &name)
                .await
                .with_context(|| format!("Failed to resolve exam '{name}'"))?;
            println!("EXAM_ID={id}");
            Some(id)
        }
        None => config.exam.exam_id.clone(),
    };

    if params.list {
        let exams = resolver.list_exams(&exam_type_id).await?;
        print_candidates("Exams", &exams);
    }

    let Some(exam_id) = exam_id else {
        if params.location.is_some() || params.list {
            println!("Set --exam, EXAM_NAME or EXAM_ID to look up locations");
        }
        return Ok(());
    };

    if let Some(name) = params.location.or(config.exam.location_name.clone()) {
        let id = resolver
            .resolve_location_id(&exam_type_id, &exam_id, &name)
            .await
            .with_context(|| format!("Failed to resolve location '{name}'"))?;
        println!("LOCATION_ID={id}");
    }

    if params.list {
        let locations = resolver.list_locations(&exam_type_id, &exam_id).await?;
        print_candidates("Locations", &locations);
    }

    Ok(())
}

fn print_candidates(title: &str, candidates: &[Candidate]) {
    println!("{title} ({}):", candidates.len());
    for candidate in candidates {
        println!("  {:>8}  {}", candidate.id, candidate.name);
    }
}
