use approx::assert_relative_eq;
use forecast_service::data::PriceSeries;
use forecast_service::models::arima::Arima;
use forecast_service::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use forecast_service::ForecastError;
use price_math::optimize::NelderMead;
use rstest::rstest;

/// Thirty days of wobbly prices with a mild upward drift
fn wobbly_prices() -> Vec<f64> {
    (0..30)
        .map(|i| {
            let t = i as f64;
            50.0 + 0.3 * t + 6.0 * (0.7 * t).sin() + 3.0 * (1.9 * t).cos()
        })
        .collect()
}

/// The kind of series the random placeholder provider produces
fn scattered_prices() -> Vec<f64> {
    vec![
        63.2, 17.9, 88.4, 45.1, 29.7, 71.3, 12.6, 94.0, 55.8, 38.2, 80.9, 23.4, 67.5, 41.0, 99.1,
        15.3, 58.7, 76.2, 33.9, 49.4, 85.6, 20.1, 62.8, 11.7, 73.5, 46.3, 90.2, 27.8, 54.6, 36.4,
    ]
}

fn series(prices: Vec<f64>) -> PriceSeries {
    PriceSeries::new("wheat", prices).unwrap()
}

#[rstest]
#[case(wobbly_prices())]
#[case(scattered_prices())]
fn test_arima_forecasts_seven_finite_values(#[case] prices: Vec<f64>) {
    let model = Arima::new(2, 1, 2).unwrap();
    let trained = model.train(&series(prices)).unwrap();

    let forecast = trained.forecast(7).unwrap();

    assert_eq!(forecast.horizons(), 7);
    assert_eq!(forecast.values().len(), 7);
    assert!(forecast.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_arima_is_deterministic() {
    let model = Arima::new(2, 1, 2).unwrap();

    let first = model.train(&series(wobbly_prices())).unwrap().forecast(7).unwrap();
    let second = model.train(&series(wobbly_prices())).unwrap().forecast(7).unwrap();

    assert_eq!(first.values(), second.values());
}

#[test]
fn test_arima_forecast_stays_in_a_plausible_range() {
    let prices = scattered_prices();
    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = max - min;

    let trained = Arima::new(2, 1, 2).unwrap().train(&series(prices)).unwrap();
    let forecast = trained.forecast(7).unwrap();

    for value in forecast.values() {
        assert!(*value > min - width && *value < max + width, "{} out of range", value);
    }
}

#[test]
fn test_arima_confidence_intervals_bracket_and_widen() {
    let trained = Arima::new(2, 1, 2)
        .unwrap()
        .train(&series(wobbly_prices()))
        .unwrap();

    let forecast = trained.forecast_with_confidence(7, 0.95).unwrap();
    let intervals = forecast.intervals().unwrap();
    assert_eq!(intervals.len(), 7);

    for ((lower, upper), value) in intervals.iter().zip(forecast.values()) {
        assert!(lower < value && value < upper);
    }

    let widths: Vec<f64> = intervals.iter().map(|(l, u)| u - l).collect();
    for pair in widths.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-9);
    }

    // narrower coverage gives narrower intervals
    let narrow = trained.forecast_with_confidence(7, 0.5).unwrap();
    let narrow_width = narrow.intervals().unwrap()[0].1 - narrow.intervals().unwrap()[0].0;
    assert!(narrow_width < widths[0]);
}

#[test]
fn test_arima_confidence_validation() {
    let trained = Arima::new(2, 1, 2)
        .unwrap()
        .train(&series(wobbly_prices()))
        .unwrap();

    assert!(trained.forecast_with_confidence(7, 0.0).is_err());
    assert!(trained.forecast_with_confidence(7, 1.0).is_err());
    assert!(trained.forecast(0).is_err());
}

fn linear_prices(start: f64, step: f64) -> Vec<f64> {
    (0..30).map(|i| start + step * i as f64).collect()
}

#[rstest]
#[case(vec![42.0; 30])]
#[case(linear_prices(10.0, 0.1))]
#[case(linear_prices(80.0, -1.5))]
#[case(linear_prices(1.0e6, 1000.0))]
fn test_arima_constant_series_is_degenerate(#[case] prices: Vec<f64>) {
    let model = Arima::new(2, 1, 2).unwrap();
    let result = model.train(&series(prices));

    assert!(matches!(result, Err(ForecastError::DegenerateSeries(_))));
}

#[test]
fn test_arima_nearly_linear_series_still_fits() {
    let prices: Vec<f64> = linear_prices(10.0, 0.1)
        .iter()
        .enumerate()
        .map(|(i, p)| p + 0.01 * (0.7 * i as f64).sin())
        .collect();

    let trained = Arima::new(2, 1, 2).unwrap().train(&series(prices)).unwrap();
    assert!(trained.forecast(7).unwrap().values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_arima_too_short_series() {
    let model = Arima::new(2, 1, 2).unwrap();
    let result = model.train(&series(vec![1.0, 2.0, 4.0, 3.0, 5.0]));

    match result {
        Err(ForecastError::InsufficientData { required, actual }) => {
            assert_eq!(required, 15);
            assert_eq!(actual, 5);
        }
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

/// Linear congruential shocks in [-0.5, 0.5), reproducible across runs
fn lcg_shocks(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x853c_49e6_748f_ea9b;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

#[test]
fn test_arima_recovers_ar1_coefficient() {
    let shocks = lcg_shocks(400);
    let mut values = vec![10.0];
    for shock in &shocks[1..] {
        let prev = values[values.len() - 1];
        values.push(10.0 + 0.7 * (prev - 10.0) + shock);
    }

    let trained = Arima::new(1, 0, 0).unwrap().train(&series(values)).unwrap();
    assert_relative_eq!(trained.ar_coefficients()[0], 0.7, epsilon = 0.1);
    assert!(trained.ma_coefficients().is_empty());
    assert!(trained.sigma2() > 0.0);
}

#[test]
fn test_arima_fitted_values_align_with_history() {
    let prices = wobbly_prices();
    let trained = Arima::new(2, 1, 2)
        .unwrap()
        .train(&series(prices.clone()))
        .unwrap();

    let fitted = trained.fitted_values();
    assert_eq!(fitted.len(), prices.len() - 1);
    assert!(fitted.iter().all(|v| v.is_finite()));
    assert_eq!(trained.name(), "ARIMA(2,1,2)");
}

#[test]
fn test_forecast_result_operations() {
    let values = vec![105.0, 106.0, 107.0];
    let forecast = ForecastResult::new(values.clone(), 3).unwrap().with_crop("rice");

    assert_eq!(forecast.horizons(), 3);
    assert_eq!(forecast.values(), &values);
    assert_eq!(forecast.crop(), Some("rice"));

    let json = forecast.to_json().unwrap();
    assert!(json.contains("\"crop\":\"rice\""));

    let actual = vec![106.0, 107.0, 108.0];
    let error = forecast.mean_absolute_error(&actual).unwrap();
    assert_relative_eq!(error, 1.0);

    assert!(ForecastResult::new(vec![1.0], 2).is_err());
    assert!(ForecastResult::new_with_intervals(vec![1.0], 1, vec![]).is_err());
}

#[test]
fn test_model_parameter_validation() {
    assert!(matches!(
        Arima::new(11, 0, 1),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(Arima::new(1, 3, 1).is_err());
    assert_eq!(Arima::new(2, 1, 2).unwrap().min_observations(), 15);
}

#[test]
fn test_arima_iteration_cap_keeps_best_estimate() {
    let capped = NelderMead::new().with_max_iterations(2).unwrap();
    let model = Arima::new(2, 1, 2).unwrap().with_optimizer(capped);

    let trained = model.train(&series(scattered_prices())).unwrap();

    assert!(!trained.converged());
    assert_eq!(trained.order(), (2, 1, 2));
    assert!(trained.forecast(7).unwrap().values().iter().all(|v| v.is_finite()));

    let uncapped = Arima::new(2, 1, 2).unwrap().train(&series(scattered_prices())).unwrap();
    assert!(uncapped.sigma2() <= trained.sigma2() + 1e-12);
}
