use std::rc::Rc;

use leptos::prelude::*;

use crate::atlas::{Atlas, AtlasConfig, EmbeddedSource};
use crate::components::atlas_graph::{AtlasCanvas, Selection};

/// The bundled sample atlas, under the default dataset names.
pub fn sample_source() -> EmbeddedSource {
	let config = AtlasConfig::default();
	let mut source = EmbeddedSource::new()
		.with(config.names, include_str!("../../data/names.txt"))
		.with(config.connectivity, include_str!("../../data/connectivity.csv"));
	let optional = [
		(config.subsystem_names, include_str!("../../data/subsystem_names.txt")),
		(config.subsystem_membership, include_str!("../../data/subsystem_membership.csv")),
		(config.subsystem_connections, include_str!("../../data/subsystem_connections.txt")),
	];
	for (name, text) in optional {
		if let Some(name) = name {
			source = source.with(name, text);
		}
	}
	source
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = AtlasConfig::default();
	let (progress, set_progress) = signal(0.0);
	let (selection, set_selection) = signal(None::<Selection>);

	let overlay = move || {
		selection.get().map(|s| {
			view! {
				<div class="selection">
					<h2>{s.name}</h2>
					<p class="description">{s.description}</p>
					<p class="subsystems">{s.subsystems.join(", ")}</p>
					{s.link.map(|link| view! { <p class="link">{link}</p> })}
				</div>
			}
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"The atlas could not be loaded"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{Atlas::load(&config, &sample_source()).map(Rc::new).map(|atlas| {
				view! {
					<div class="fullscreen-graph">
						<AtlasCanvas
							atlas=atlas
							strategy=config.aggregation
							progress=set_progress
							selection=set_selection
							fullscreen=true
						/>
						<div class="graph-overlay">
							<h1>"Anatomy Atlas"</h1>
							<p class="subtitle">
								"Click a structure to study it, then a neighbour to follow the connection."
							</p>
							<p class="progress">
								{move || format!("{:.0}% explored", progress.get() * 100.0)}
							</p>
							{overlay}
						</div>
					</div>
				}
			})}
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_atlas_loads() {
		let atlas = Atlas::load(&AtlasConfig::default(), &sample_source()).unwrap();
		assert_eq!(atlas.graph().len(), 8);
		assert_eq!(atlas.subsystems().map(|r| r.len()), Some(3));
	}
}
