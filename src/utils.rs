use plotters::prelude::*;

pub fn moving_average(window: usize, vector: &[f64]) -> Vec<f64> {
    let window = window.max(1);
    let mut aux: usize = 0;
    let mut result: Vec<f64> = vec![];
    while aux < vector.len() {
        let end: usize = if aux + window < vector.len() {
            aux + window
        } else {
            vector.len()
        };
        let slice: &[f64] = &vector[aux..end];
        let r: f64 = slice.iter().sum();
        result.push(r / window as f64);
        aux = end;
    }
    result
}

/// Renders one line per series into `<title>.png` in the working directory.
pub fn plot_moving_average(
    series: &[Vec<f64>],
    colors: &[&'static RGBColor],
    legends: &[&str],
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = format!("{}.png", title.replace(' ', "_").to_lowercase());
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_len = series.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for s in series {
        for &v in s {
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        min_v = 0.0;
        max_v = 1.0;
    }
    if max_v - min_v < f64::EPSILON {
        max_v = min_v + 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..max_len as i32, min_v..max_v)?;
    chart.configure_mesh().draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(
                s.iter().enumerate().map(|(x, y)| (x as i32, *y)),
                color,
            ))?
            .label(legends[i % legends.len()])
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
